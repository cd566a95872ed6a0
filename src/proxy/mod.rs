//! Apache reverse-proxy configuration.
//!
//! The proxy and the server must agree on where the app listens; a vhost
//! pointing at a port while the app binds a socket (or the other way
//! round) shows up as a 503 from Apache. Rendering the vhost from the same
//! [`Bind`] the server uses keeps the two in step.

use crate::config::Bind;

/// Target URL for `ProxyPass`, matching `bind`.
pub fn proxy_target(bind: &Bind) -> String {
    match bind {
        Bind::Tcp(address) => format!("http://{address}/"),
        Bind::Unix(path) => format!("unix:{}|http://localhost/", path.display()),
    }
}

/// Renders a `<VirtualHost>` block proxying `server_name` to the app.
pub fn render_apache_vhost(server_name: &str, bind: &Bind) -> String {
    let target = proxy_target(bind);
    let mut out = String::new();

    out.push_str("<VirtualHost *:80>\n");
    out.push_str(&format!("    ServerName {server_name}\n\n"));
    out.push_str("    ProxyPreserveHost On\n");
    out.push_str("    ProxyTimeout 180\n");
    out.push_str(&format!("    ProxyPass / {target}\n"));
    out.push_str(&format!("    ProxyPassReverse / {target}\n\n"));
    out.push_str(&format!(
        "    ErrorLog ${{APACHE_LOG_DIR}}/{server_name}_error.log\n"
    ));
    out.push_str(&format!(
        "    CustomLog ${{APACHE_LOG_DIR}}/{server_name}_access.log combined\n"
    ));
    out.push_str("</VirtualHost>\n");

    out
}

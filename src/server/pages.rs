//! Server-rendered HTML pages.

use crate::storage::{Category, Generation, Selections};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; background: #fff8ec; color: #3b2f2f; margin: 0; }
main { max-width: 960px; margin: 2rem auto; padding: 0 1rem; text-align: center; }
h1 { font-size: 2.4rem; }
button { font-size: 1.2rem; padding: .6rem 1.4rem; border-radius: .6rem; border: none;
         background: #ffb347; color: #3b2f2f; cursor: pointer; }
img { max-width: 100%; border-radius: 1rem; box-shadow: 0 6px 24px rgba(0,0,0,.15); }
.tags span { display: inline-block; margin: .2rem; padding: .2rem .6rem; border-radius: 1rem; background: #ffe2b0; }
.error { color: #b00020; }
.stars button { font-size: 1.4rem; margin: 0 .2rem; }
"#;

/// Escapes text for HTML element and attribute content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<main>\n{body}\n</main>\n</body>\n</html>\n",
        escape_html(title)
    )
}

fn tags(selections: &Selections) -> String {
    let spans: Vec<String> = Category::ALL
        .iter()
        .filter_map(|c| selections.get(*c))
        .map(|name| format!("<span>{}</span>", escape_html(name)))
        .collect();
    format!("<p class=\"tags\">{}</p>", spans.join(""))
}

fn rating_form() -> String {
    let buttons: String = (1..=5)
        .map(|n| format!("<button name=\"rating\" value=\"{n}\">{}</button>", "★".repeat(n)))
        .collect();
    format!("<form class=\"stars\" method=\"post\" action=\"/rate\">{buttons}</form>")
}

/// Landing page with the generate button.
pub fn index_page() -> String {
    let body = r#"<h1>I Need A Smile</h1>
<p>One click, one ridiculous little scene. Rate it so the next one gets better.</p>
<form method="post" action="/generate" id="smile-form">
  <button type="submit">Make me smile</button>
</form>
<p id="status"></p>
<div id="result"></div>
<p><a href="/album">Album</a></p>
<script>
document.getElementById('smile-form').addEventListener('submit', async (event) => {
  event.preventDefault();
  const status = document.getElementById('status');
  const result = document.getElementById('result');
  status.textContent = 'Painting something silly...';
  result.innerHTML = '';
  try {
    const response = await fetch('/generate_async', { method: 'POST' });
    const data = await response.json();
    if (!response.ok) { status.textContent = data.error; status.className = 'error'; return; }
    status.textContent = Object.values(data.selections).join(' / ');
    status.className = '';
    const img = document.createElement('img');
    img.src = data.image_url;
    img.alt = data.prompt;
    result.appendChild(img);
    const form = document.createElement('form');
    form.className = 'stars'; form.method = 'post'; form.action = '/rate';
    for (let n = 1; n <= 5; n++) {
      const b = document.createElement('button');
      b.name = 'rating'; b.value = n; b.textContent = '★'.repeat(n);
      form.appendChild(b);
    }
    result.appendChild(form);
  } catch (err) {
    status.textContent = 'Something went wrong: ' + err;
    status.className = 'error';
  }
});
</script>"#;
    layout("I Need A Smile", body)
}

/// Result page for the form-based flow.
pub fn image_page(generation: &Generation) -> String {
    let body = format!(
        "<h1>Here you go</h1>\n{}\n<img src=\"/static/{}\" alt=\"{}\">\n\
         <p>How much did that make you smile?</p>\n{}\n<p><a href=\"/\">Start over</a></p>",
        tags(&generation.selections),
        escape_html(&generation.image_path),
        escape_html(&generation.prompt),
        rating_form()
    );
    layout("Your smile", &body)
}

/// Result page when generation failed.
pub fn error_page(message: &str) -> String {
    let body = format!(
        "<h1>No smile this time</h1>\n<p class=\"error\">{}</p>\n\
         <form method=\"post\" action=\"/generate\"><button type=\"submit\">Try again</button></form>",
        escape_html(message)
    );
    layout("No smile this time", &body)
}

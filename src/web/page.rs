//! Chat page served at `/`.
//!
//! A single static page; the transcript is fetched from `/api/history` and
//! every question goes through `/api/ask`.

use axum::{extract::State, response::Html};

use super::WebState;

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{{TITLE}}</title>
  <style>
    *, *::before, *::after { box-sizing: border-box; }
    body {
      font-family: system-ui, -apple-system, sans-serif;
      margin: 0; background: #fafafa; color: #222;
      display: flex; flex-direction: column; height: 100vh;
    }
    header { padding: 1rem 1.5rem; border-bottom: 1px solid #ddd; background: #fff; }
    h1 { font-size: 1.4rem; margin: 0 0 0.5rem 0; }
    .tiers label { margin-right: 1.25rem; font-size: 0.95rem; }
    .model { color: #777; font-size: 0.85rem; }
    #history { flex: 1; overflow-y: auto; padding: 1rem 1.5rem; }
    .msg { max-width: 48rem; margin: 0 0 0.75rem 0; padding: 0.6rem 0.9rem;
           border-radius: 8px; white-space: pre-wrap; line-height: 1.4; }
    .user { background: #e8f0fe; margin-left: auto; }
    .assistant { background: #fff; border: 1px solid #e3e3e3; }
    .thinking { color: #888; font-style: italic; }
    .error { background: #fdecea; color: #8a1f11; border: 1px solid #f5c6c0; }
    .usage { display: block; margin-top: 0.4rem; color: #999; font-size: 0.75rem; }
    form { display: flex; gap: 0.5rem; padding: 1rem 1.5rem; border-top: 1px solid #ddd; background: #fff; }
    input[type=text] { flex: 1; padding: 0.6rem; font-size: 1rem; border: 1px solid #ccc; border-radius: 6px; }
    button { padding: 0.6rem 1.2rem; font-size: 1rem; border: 0; border-radius: 6px; background: #1a73e8; color: #fff; cursor: pointer; }
    button:disabled { background: #9bbcf0; cursor: default; }
  </style>
</head>
<body>
  <header>
    <h1>{{TITLE}}</h1>
    <div class="tiers">
      <label><input type="radio" name="tier" value="fast" checked /> Fast (cheaper, less accurate)</label>
      <label><input type="radio" name="tier" value="accurate" /> Accurate (slower, more expensive)</label>
      <span class="model" id="model"></span>
    </div>
  </header>
  <main id="history"></main>
  <form id="ask">
    <input type="text" id="question" placeholder="Ask a question about your CSV: " autocomplete="off" />
    <button type="submit" id="send">Send</button>
  </form>
  <script>
    const historyEl = document.getElementById('history');
    const form = document.getElementById('ask');
    const input = document.getElementById('question');
    const send = document.getElementById('send');
    const modelLabel = document.getElementById('model');

    function append(role, text, extra) {
      const div = document.createElement('div');
      div.className = 'msg ' + role;
      div.textContent = text;
      if (extra) {
        const small = document.createElement('span');
        small.className = 'usage';
        small.textContent = extra;
        div.appendChild(small);
      }
      historyEl.appendChild(div);
      historyEl.scrollTop = historyEl.scrollHeight;
      return div;
    }

    function showTier(tier, model) {
      document.querySelectorAll('input[name=tier]').forEach(r => { r.checked = r.value === tier; });
      modelLabel.textContent = model ? '(' + model + ')' : '';
    }

    async function loadHistory() {
      const res = await fetch('/api/history');
      const body = await res.json();
      historyEl.innerHTML = '';
      body.messages.forEach(m => append(m.role, m.content));
      showTier(body.tier, body.model);
    }

    document.querySelectorAll('input[name=tier]').forEach(radio => {
      radio.addEventListener('change', async () => {
        const res = await fetch('/api/tier', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({ tier: radio.value })
        });
        const body = await res.json();
        if (res.ok) {
          showTier(body.tier, body.model);
        } else {
          append('error', body.message);
          loadHistory();
        }
      });
    });

    form.addEventListener('submit', async (event) => {
      event.preventDefault();
      const question = input.value.trim();
      if (!question) return;
      input.value = '';
      send.disabled = true;
      append('user', question);
      const placeholder = append('assistant thinking', 'Thinking...');
      const tier = document.querySelector('input[name=tier]:checked').value;
      try {
        const res = await fetch('/api/ask', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({ question, tier })
        });
        const body = await res.json();
        placeholder.remove();
        if (res.ok) {
          const u = body.usage;
          append('assistant', body.answer,
            u.model + ' | ' + u.total_tokens + ' tokens | $' + u.total_cost_usd.toFixed(4));
          showTier(body.tier, body.model);
        } else {
          append('error', body.message);
        }
      } catch (err) {
        placeholder.remove();
        append('error', String(err));
      } finally {
        send.disabled = false;
        input.focus();
      }
    });

    loadHistory();
  </script>
</body>
</html>
"#;

/// GET /
pub(super) async fn index(State(state): State<WebState>) -> Html<String> {
    Html(render_index(&state.title))
}

fn render_index(title: &str) -> String {
    INDEX_HTML.replace("{{TITLE}}", &escape_html(title))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

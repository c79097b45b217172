//! Chat page served at `/`.
//!
//! A single self-contained HTML document: message list, text box, a Send
//! button and a full-reset button. The script keeps the session id in
//! `sessionStorage` so a reload shows the same conversation, and renders
//! failures as a visible error bubble instead of failing silently.

use axum::{extract::State, response::Html};

use super::AxumState;

const TITLE_SLOT: &str = "{{title}}";

const CHAT_PAGE_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{{title}}</title>
  <style>
    *, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }
    body {
      font-family: system-ui, -apple-system, sans-serif;
      background: #0f0f0f; color: #e0e0e0;
      display: flex; flex-direction: column; align-items: center;
      height: 100vh; padding: 1.5rem;
    }
    h1 { font-size: 1.5rem; margin-bottom: 1rem; }
    #chat {
      flex: 1; width: 100%; max-width: 760px; overflow-y: auto;
      border: 1px solid #333; border-radius: 12px; background: #1a1a1a;
      padding: 1rem; display: flex; flex-direction: column; gap: 0.6rem;
    }
    .bubble {
      max-width: 80%; padding: 0.55rem 0.85rem; border-radius: 10px;
      white-space: pre-wrap; word-wrap: break-word; font-size: 0.95rem;
    }
    .user      { align-self: flex-end;   background: #2a2a3a; color: #d0d0f0; }
    .assistant { align-self: flex-start; background: #242424; }
    .pending   { align-self: flex-start; background: #242424; color: #777; font-style: italic; }
    .error     { align-self: stretch; max-width: 100%; background: #3a1a1a; color: #f0b0b0; border: 1px solid #6a2a2a; }
    form { width: 100%; max-width: 760px; display: flex; gap: 0.5rem; margin-top: 0.8rem; }
    textarea {
      flex: 1; resize: none; height: 3rem; padding: 0.6rem;
      border-radius: 8px; border: 1px solid #333; background: #1a1a1a; color: #e0e0e0;
      font: inherit;
    }
    button {
      padding: 0 1.1rem; border-radius: 8px; border: none;
      background: #2a2a3a; color: #c0c0e0; font-size: 0.9rem; cursor: pointer;
      transition: background 0.15s;
    }
    button:hover:not(:disabled) { background: #3a3a5a; }
    button:disabled { opacity: 0.5; cursor: default; }
  </style>
</head>
<body>
  <h1>{{title}}</h1>
  <div id="chat" aria-live="polite"></div>
  <form id="composer">
    <textarea id="msg" placeholder="Type your message..." autofocus></textarea>
    <button type="submit" id="send">Send</button>
    <button type="button" id="clear">Clear Chat (Full Reset)</button>
  </form>
  <script>
    const KEY = "chatbridge.session_id";
    const chat = document.getElementById("chat");
    const input = document.getElementById("msg");
    const send = document.getElementById("send");
    const clear = document.getElementById("clear");

    function bubble(cls, text) {
      const el = document.createElement("div");
      el.className = "bubble " + cls;
      el.textContent = text;
      chat.appendChild(el);
      chat.scrollTop = chat.scrollHeight;
      return el;
    }

    function render(transcript) {
      chat.replaceChildren();
      for (const pair of transcript) {
        bubble("user", pair.input);
        bubble("assistant", pair.output);
      }
    }

    function busy(on) {
      send.disabled = on;
      clear.disabled = on;
      input.disabled = on;
    }

    async function call(method, url, body) {
      const res = await fetch(url, {
        method,
        headers: body ? { "content-type": "application/json" } : {},
        body: body ? JSON.stringify(body) : undefined,
      });
      let data = null;
      try { data = await res.json(); } catch (_) { /* non-JSON body */ }
      if (!res.ok) {
        const err = new Error((data && data.message) || ("HTTP " + res.status));
        err.kind = data && data.error;
        err.status = res.status;
        err.sessionId = data && data.session_id;
        throw err;
      }
      return data;
    }

    async function sendMessage() {
      const text = input.value;
      if (!text.trim()) return;
      busy(true);
      bubble("user", text);
      const pending = bubble("pending", "...");
      try {
        const data = await call("POST", "/api/message", {
          message: text,
          session_id: sessionStorage.getItem(KEY),
        });
        sessionStorage.setItem(KEY, data.session_id);
        render(data.transcript);
        input.value = "";
      } catch (e) {
        // A failed first turn still opened a session; keep using it.
        if (e.sessionId) sessionStorage.setItem(KEY, e.sessionId);
        pending.remove();
        bubble("error", "Error" + (e.kind ? " (" + e.kind + ")" : "") + ": " + e.message);
      } finally {
        busy(false);
        input.focus();
      }
    }

    async function resetChat() {
      busy(true);
      try {
        const data = await call("POST", "/api/reset", { session_id: sessionStorage.getItem(KEY) });
        sessionStorage.setItem(KEY, data.session_id);
        render(data.transcript);
        input.value = "";
      } catch (e) {
        bubble("error", "Reset failed: " + e.message);
      } finally {
        busy(false);
        input.focus();
      }
    }

    async function restore() {
      const id = sessionStorage.getItem(KEY);
      if (!id) return;
      try {
        const data = await call("GET", "/api/session/" + encodeURIComponent(id));
        render(data.transcript);
      } catch (e) {
        if (e.status === 404) sessionStorage.removeItem(KEY);
        else bubble("error", "Could not load conversation: " + e.message);
      }
    }

    document.getElementById("composer").addEventListener("submit", (ev) => {
      ev.preventDefault();
      sendMessage();
    });
    input.addEventListener("keydown", (ev) => {
      if (ev.key === "Enter" && !ev.shiftKey) {
        ev.preventDefault();
        sendMessage();
      }
    });
    clear.addEventListener("click", resetChat);
    restore();
  </script>
</body>
</html>
"#;

/// Render the chat page with `title` escaped into the heading and `<title>`.
pub(super) fn render_page(title: &str) -> String {
    CHAT_PAGE_HTML.replace(TITLE_SLOT, &escape_html(title))
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

/// GET /
pub(super) async fn root(State(state): State<AxumState>) -> Html<String> {
    Html(state.page.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_escaped_everywhere() {
        let page = render_page("<b>Tom & Jerry</b>");
        assert!(!page.contains(TITLE_SLOT));
        assert_eq!(page.matches("&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;").count(), 2);
    }

    #[test]
    fn page_has_controls() {
        let page = render_page("Chatbot");
        assert!(page.contains(r#"id="send""#));
        assert!(page.contains("Clear Chat (Full Reset)"));
        assert!(page.contains("sessionStorage"));
    }

    #[test]
    fn failed_turn_keeps_server_session_id() {
        let page = render_page("Chatbot");
        assert!(page.contains("err.sessionId = data && data.session_id;"));
        assert!(page.contains("if (e.sessionId) sessionStorage.setItem(KEY, e.sessionId);"));
    }
}

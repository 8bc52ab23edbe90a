//! Browser chat page served at `/`

pub const PAGE_TITLE: &str = "Dominic RAG LLM";
pub const PAGE_DESCRIPTION: &str =
    "Enter a question below to chat with my Claude-RAG solution that pretends to be me!";
pub const INPUT_PLACEHOLDER: &str = "Ask me anything...";

/// Single-file chat UI. The session id lives in `sessionStorage`, so a reload
/// keeps the conversation and a new tab starts a fresh one.
pub const CHAT_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Dominic RAG LLM</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 760px; margin: 0 auto; padding: 1.5rem; }
  h1 { margin-bottom: 0.25rem; }
  #messages { display: flex; flex-direction: column; gap: 0.75rem; margin: 1.5rem 0 6rem; }
  .message { padding: 0.75rem 1rem; border-radius: 0.5rem; white-space: pre-wrap; }
  .message .role { font-size: 0.75rem; font-weight: 600; text-transform: uppercase; opacity: 0.6; }
  .user { background: #f0f2f6; }
  .assistant { background: #e8f4ea; }
  form { position: fixed; bottom: 0; left: 0; right: 0; background: #fff; padding: 1rem; }
  form input { display: block; width: 100%; max-width: 760px; margin: 0 auto; padding: 0.75rem;
               font-size: 1rem; box-sizing: border-box; }
</style>
</head>
<body>
<h1>Dominic RAG LLM</h1>
<p>Enter a question below to chat with my Claude-RAG solution that pretends to be me!</p>
<div id="messages"></div>
<form id="chat">
  <input id="input" type="text" placeholder="Ask me anything..." autocomplete="off" autofocus>
</form>
<script>
const messagesEl = document.getElementById("messages");
const form = document.getElementById("chat");
const input = document.getElementById("input");
let sessionId = sessionStorage.getItem("personarag-session");

function appendMessage(role, content) {
  const el = document.createElement("div");
  el.className = "message " + role;
  const label = document.createElement("div");
  label.className = "role";
  label.textContent = role;
  const body = document.createElement("div");
  body.textContent = content;
  el.append(label, body);
  messagesEl.append(el);
  window.scrollTo(0, document.body.scrollHeight);
  return body;
}

function render(messages) {
  messagesEl.replaceChildren();
  for (const m of messages) appendMessage(m.role, m.content);
}

async function ensureSession() {
  if (sessionId) {
    const res = await fetch("/api/sessions/" + sessionId);
    if (res.ok) {
      render((await res.json()).data.messages);
      return;
    }
  }
  const res = await fetch("/api/sessions", { method: "POST" });
  sessionId = (await res.json()).data.session_id;
  sessionStorage.setItem("personarag-session", sessionId);
  render([]);
}

async function submit(content) {
  input.disabled = true;
  let pending = null;
  try {
    const res = await fetch("/api/sessions/" + sessionId + "/messages/stream", {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify({ content }),
    });
    if (!res.ok) {
      const body = await res.json().catch(() => ({}));
      appendMessage("assistant", body.error || "Request failed (" + res.status + ")");
      return;
    }
    const reader = res.body.getReader();
    const decoder = new TextDecoder();
    let buffer = "";
    for (;;) {
      const { value, done } = await reader.read();
      if (done) break;
      buffer += decoder.decode(value, { stream: true });
      let split;
      while ((split = buffer.indexOf("\n\n")) >= 0) {
        const raw = buffer.slice(0, split);
        buffer = buffer.slice(split + 2);
        let event = "message";
        let data = "";
        for (const line of raw.split("\n")) {
          if (line.startsWith("event:")) event = line.slice(6).trim();
          else if (line.startsWith("data:")) data += line.slice(5).trim();
        }
        if (!data) continue;
        const payload = JSON.parse(data);
        if (event === "user") {
          appendMessage("user", payload.content);
        } else if (event === "delta") {
          if (!pending) pending = appendMessage("assistant", "");
          pending.textContent += payload.text;
        } else if (event === "assistant") {
          if (pending) pending.textContent = payload.content;
          else appendMessage("assistant", payload.content);
          pending = null;
        }
      }
    }
  } finally {
    input.disabled = false;
    input.focus();
  }
}

form.addEventListener("submit", async (e) => {
  e.preventDefault();
  const content = input.value;
  if (!content.trim()) return;
  input.value = "";
  await submit(content);
});

ensureSession();
</script>
</body>
</html>
"#;

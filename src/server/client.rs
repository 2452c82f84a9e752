// src/server/client.rs

//! Browser side of live reload.

pub const CLIENT_PATH: &str = "/__sitepipe/client.js";
pub const WS_PATH: &str = "/__sitepipe/ws";

/// Connects to the reload socket. `reload` reloads the page; `inject-css`
/// re-requests every stylesheet with a cache-busting query.
pub const CLIENT_JS: &str = r#"(function () {
  var proto = location.protocol === "https:" ? "wss://" : "ws://";
  var socket = new WebSocket(proto + location.host + "/__sitepipe/ws");
  socket.onmessage = function (msg) {
    var data;
    try { data = JSON.parse(msg.data); } catch (e) { return; }
    if (data.type === "reload") {
      location.reload();
    } else if (data.type === "inject-css") {
      var links = document.querySelectorAll('link[rel="stylesheet"]');
      for (var i = 0; i < links.length; i++) {
        var href = links[i].href.replace(/[?&]__sitepipe=\d+/, "");
        links[i].href = href + (href.indexOf("?") < 0 ? "?" : "&") + "__sitepipe=" + Date.now();
      }
    }
  };
})();
"#;

/// Insert the client `<script>` before the last `</body>`, or append it when
/// the page has none.
pub fn inject_client_script(html: &str) -> String {
    let tag = format!("<script src=\"{CLIENT_PATH}\"></script>");
    let lower = html.to_ascii_lowercase();
    match lower.rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..idx]);
            out.push_str(&tag);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{html}{tag}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injects_before_closing_body() {
        let out = inject_client_script("<html><BODY><p>hi</p></BODY></html>");
        assert_eq!(
            out,
            "<html><BODY><p>hi</p><script src=\"/__sitepipe/client.js\"></script></BODY></html>"
        );
    }

    #[test]
    fn appends_without_body() {
        let out = inject_client_script("<p>fragment</p>");
        assert!(out.ends_with("<script src=\"/__sitepipe/client.js\"></script>"));
    }
}

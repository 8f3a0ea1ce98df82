use anyhow::Result;
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

// Clipboard worker channel, initialized once on first copy.
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Start the clipboard worker thread if not already running.
/// Each copy gets its own clipboard instance, kept alive long enough for
/// clipboard managers to take ownership of the contents.
fn clipboard_worker() -> &'static std_mpsc::Sender<String> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                match Clipboard::new() {
                    Ok(mut clipboard) => match clipboard.set_text(&text) {
                        Ok(()) => std::thread::sleep(Duration::from_secs(2)),
                        Err(e) => tracing::warn!(error = %e, "clipboard write failed"),
                    },
                    Err(e) => tracing::warn!(error = %e, "clipboard unavailable"),
                }
            }
        });

        tx
    })
}

/// Queue `text` for the clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    clipboard_worker()
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}

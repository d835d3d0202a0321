use crate::error::Result;
use crate::models::session::SessionState;
use crate::services::session::{RecognitionOutcome, SessionController};
use std::io::Write;
use std::path::Path;

/// Upload `image`, recognize it and write the result to `out`
///
/// Progress percentages go to stderr while the run is active.
pub async fn recognize_file<W: Write>(
    session: &SessionController,
    image: &Path,
    json: bool,
    out: &mut W,
) -> Result<RecognitionOutcome> {
    let mut progress = session.progress_stream();
    let printer = tokio::spawn(async move {
        while let Some(percent) = progress.recv().await {
            eprintln!("{} %", percent);
        }
    });

    let outcome = match session.upload(Some(image)).await {
        Ok(_) => session.recognize().await,
        Err(e) => Err(e),
    };

    // Terminating the engine closes the progress stream
    let teardown = session.reset_engine().await;
    let _ = printer.await;
    let outcome = outcome?;
    teardown?;

    write_state(&session.snapshot(), json, out)?;
    Ok(outcome)
}

/// Render the session as `"<text> - <index>"` lines or as JSON
pub fn write_state<W: Write>(state: &SessionState, json: bool, out: &mut W) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, state)?;
        writeln!(out)?;
        return Ok(());
    }

    for line in &state.lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ocr_result::FilteredLine;
    use crate::services::ocr::scripted::Script;

    #[tokio::test]
    async fn test_recognize_file_prints_lines() {
        let script = Script::new().text("Привет мир\n\nhello\nЁж");
        let session = SessionController::new(script.factory(), "rus");

        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"png").unwrap();

        let mut out = Vec::new();
        let outcome = recognize_file(&session, file.path(), false, &mut out)
            .await
            .unwrap();

        assert!(matches!(outcome, RecognitionOutcome::Completed(ref lines) if lines.len() == 3));
        assert_eq!(String::from_utf8(out).unwrap(), "ПРИВЕТМИР - 1\n - 2\nЖ - 3\n");
        assert_eq!(session.engine_state(), None);
    }

    #[tokio::test]
    async fn test_recognize_missing_file_fails() {
        let script = Script::new();
        let session = SessionController::new(script.factory(), "rus");
        let dir = tempfile::tempdir().unwrap();

        let mut out = Vec::new();
        let result = recognize_file(&session, &dir.path().join("none.png"), false, &mut out).await;

        assert!(result.is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_write_state_json() {
        let state = SessionState {
            lines: vec![FilteredLine::new(1, "ДА")],
            progress: Some(1.0),
            ..SessionState::default()
        };

        let mut out = Vec::new();
        write_state(&state, true, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["lines"][0]["text"], "ДА");
        assert_eq!(value["lines"][0]["index"], 1);
    }
}

use std::io::{self, Write};

use serde::Serialize;

use crate::state::PlayerState;

/// One JSON line describing the session, as consumed by the UI.
#[derive(Serialize, Debug)]
pub struct StatusLine {
    state: &'static str,
    ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    artist_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl StatusLine {
    /// Flatten the tagged state into the line the UI renders.
    #[must_use]
    pub fn new(state: &PlayerState, ready: bool) -> Self {
        let mut line = Self {
            state: state_tag(state),
            ready,
            title: None,
            artist: None,
            image: None,
            artist_image: None,
            position_ms: None,
            duration_ms: None,
            paused: None,
            error: None,
        };
        match state {
            PlayerState::Playing {
                item,
                position,
                paused,
            } => {
                line.title = Some(escape(&item.title));
                line.artist = Some(escape(&item.artist));
                line.image = item.image.clone();
                line.artist_image = item.artist_image.clone();
                line.position_ms = Some(position.as_millis() as u64);
                line.duration_ms = Some(item.duration.as_millis() as u64);
                line.paused = Some(*paused);
            }
            PlayerState::Error(reason) => line.error = Some(escape(reason)),
            _ => {}
        }
        line
    }

    /// Format the line as JSON and write it to the given writer.
    ///
    /// # Errors
    ///
    /// This function will return an error if writing to the given writer fails.
    pub fn format<T: Write>(&self, mut f: &mut T) -> io::Result<()> {
        serde_json::to_writer(&mut f, self)?;
        f.write_all(b"\n")?;
        Ok(())
    }

    /// Print the line to stdout.
    ///
    /// # Errors
    ///
    /// This function will return an error if writing to stdout fails.
    pub fn print(&self) -> io::Result<()> {
        self.format(&mut io::stdout().lock())
    }
}

fn state_tag(state: &PlayerState) -> &'static str {
    match state {
        PlayerState::NotStarted => "stopped",
        PlayerState::Connecting => "connecting",
        PlayerState::Idle => "idle",
        PlayerState::Playing { paused: true, .. } => "paused",
        PlayerState::Playing { .. } => "playing",
        PlayerState::Error(_) => "error",
    }
}

fn escape(text: &str) -> String {
    String::from(html_escape::encode_text(text))
}

#[cfg(test)]
pub mod tests {
    use std::time::Duration;

    use super::*;
    use crate::state::PlayingNow;

    fn playing() -> PlayerState {
        PlayerState::Playing {
            item: PlayingNow {
                item_id: "t1".to_owned(),
                title: "Song & Dance".to_owned(),
                artist: "Alpha, Beta".to_owned(),
                image: Some("https://img.example/cover.jpg".to_owned()),
                artist_image: None,
                duration: Duration::from_secs(200),
            },
            position: Duration::from_secs(10),
            paused: false,
        }
    }

    #[test]
    fn test_format() {
        let line = StatusLine::new(&playing(), true);
        let mut buf = Vec::new();
        line.format(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "{\"state\":\"playing\",\"ready\":true,\"title\":\"Song &amp; Dance\",\"artist\":\"Alpha, Beta\",\"image\":\"https://img.example/cover.jpg\",\"position_ms\":10000,\"duration_ms\":200000,\"paused\":false}\n"
        );
    }

    #[test]
    fn test_missing_fields() {
        let line = StatusLine::new(&PlayerState::Idle, true);
        let mut buf = Vec::new();
        line.format(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "{\"state\":\"idle\",\"ready\":true}\n"
        );
    }

    #[test]
    fn test_state_tags() {
        assert_eq!(state_tag(&PlayerState::NotStarted), "stopped");
        assert_eq!(state_tag(&PlayerState::Connecting), "connecting");
        assert_eq!(state_tag(&PlayerState::Error("x".to_owned())), "error");
        let PlayerState::Playing { item, position, .. } = playing() else {
            unreachable!()
        };
        assert_eq!(
            state_tag(&PlayerState::Playing {
                item,
                position,
                paused: true
            }),
            "paused"
        );
    }
}

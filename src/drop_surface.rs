//! Whole-viewport drag-and-drop capture.
//!
//! Terminals deliver a file dragged onto the window as a bracketed paste of
//! its path, so the app shell turns `Event::Paste` into enter/over/drop and
//! `Event::FocusLost` into leave.

use std::path::PathBuf;

use crate::{pending::PendingFile, validate};

/// Drag indication state. Independent of the upload workflow.
#[derive(Clone, Debug)]
pub struct DropSurface {
    active: bool,
    ceiling: u64,
}

impl DropSurface {
    pub fn new(ceiling: u64) -> Self {
        Self {
            active: false,
            ceiling,
        }
    }

    /// Whether the drop overlay is currently engaged.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn drag_enter(&mut self) {
        self.active = true;
    }

    pub fn drag_leave(&mut self) {
        self.active = false;
    }

    /// Nothing to suppress in a terminal and the flag is left alone.
    pub fn drag_over(&mut self) {}

    /// Take the first dropped file, if any, for forwarding to the controller.
    ///
    /// An oversize file disengages the overlay but is still returned: the
    /// controller is the one that rejects it.
    pub fn drop(&mut self, files: Vec<PendingFile>) -> Option<PendingFile> {
        let file = files.into_iter().next()?;
        if !validate::validate_with_ceiling(file.size, self.ceiling).is_accepted() {
            self.active = false;
        }
        Some(file)
    }
}

/// Split pasted text into candidate paths.
///
/// Handles one path per line, shell quoting (`'...'`, `"..."`), backslash
/// escapes and `file://` URIs, which is what common terminals emit on drop.
/// A backslash before an ordinary character is kept, so unquoted Windows
/// paths survive as long as they contain no spaces.
pub fn parse_dropped_paths(text: &str) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for line in text.lines() {
        for token in split_tokens(line.trim()) {
            if let Some(p) = token_to_path(&token) {
                out.push(p);
            }
        }
    }
    out
}

fn split_tokens(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut cur = String::new();
    let mut quote: Option<char> = None;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => cur.push(c),
            (None, '\'' | '"') => quote = Some(c),
            (None, '\\') => match chars.peek() {
                Some(&next) if is_escapable(next) => {
                    cur.push(next);
                    chars.next();
                }
                _ => cur.push('\\'),
            },
            (None, c) if c.is_whitespace() => {
                if !cur.is_empty() {
                    tokens.push(std::mem::take(&mut cur));
                }
            }
            (None, c) => cur.push(c),
        }
    }
    if !cur.is_empty() {
        tokens.push(cur);
    }
    tokens
}

/// Characters a shell escapes with a backslash.
fn is_escapable(c: char) -> bool {
    c.is_whitespace() || "\\'\"()[]{}&;|<>!$`*?#~".contains(c)
}

fn token_to_path(token: &str) -> Option<PathBuf> {
    if token.is_empty() {
        return None;
    }
    match token.strip_prefix("file://") {
        Some(rest) => {
            // file://host/path — only the local host form is meaningful here.
            let rest = rest.strip_prefix("localhost").unwrap_or(rest);
            let decoded = urlencoding::decode(rest).ok()?;
            Some(PathBuf::from(decoded.into_owned()))
        }
        None => Some(PathBuf::from(token)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(size: u64) -> PendingFile {
        PendingFile::new("x.wav".into(), size, "x.wav".into())
    }

    #[test]
    fn test_enter_then_leave_clears_flag() {
        let mut s = DropSurface::new(validate::MAX_FILE_SIZE);
        s.drag_enter();
        assert!(s.is_active());
        s.drag_over();
        assert!(s.is_active());
        s.drag_leave();
        assert!(!s.is_active());
    }

    #[test]
    fn test_drop_forwards_first_file() {
        let mut s = DropSurface::new(validate::MAX_FILE_SIZE);
        s.drag_enter();
        let a = file(10);
        let b = file(20);
        let got = s.drop(vec![a.clone(), b]).unwrap();
        assert_eq!(got.id, a.id);
        // An acceptable drop leaves the indication as it was.
        assert!(s.is_active());
    }

    #[test]
    fn test_oversize_drop_disengages_but_still_forwards() {
        let mut s = DropSurface::new(validate::MAX_FILE_SIZE);
        s.drag_enter();
        let big = file(30_000_001);
        let got = s.drop(vec![big.clone()]);
        assert_eq!(got, Some(big));
        assert!(!s.is_active());
    }

    #[test]
    fn test_empty_drop_is_ignored() {
        let mut s = DropSurface::new(validate::MAX_FILE_SIZE);
        s.drag_enter();
        assert!(s.drop(vec![]).is_none());
        assert!(s.is_active());
    }

    #[test]
    fn test_parse_plain_and_escaped_paths() {
        let paths = parse_dropped_paths("/tmp/a.wav /tmp/my\\ song.mp3");
        assert_eq!(
            paths,
            vec![PathBuf::from("/tmp/a.wav"), PathBuf::from("/tmp/my song.mp3")]
        );
    }

    #[test]
    fn test_parse_quoted_and_uri_paths() {
        let paths = parse_dropped_paths("'/tmp/with space.flac'\nfile:///tmp/b%20c.ogg\n");
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/tmp/with space.flac"),
                PathBuf::from("/tmp/b c.ogg")
            ]
        );
    }

    #[test]
    fn test_parse_keeps_backslash_before_plain_chars() {
        let paths = parse_dropped_paths(r"C:\Users\a.wav /tmp/x\(1\).mp3");
        assert_eq!(
            paths,
            vec![
                PathBuf::from(r"C:\Users\a.wav"),
                PathBuf::from("/tmp/x(1).mp3")
            ]
        );
    }

    #[test]
    fn test_parse_blank_text() {
        assert!(parse_dropped_paths("   \n").is_empty());
    }
}

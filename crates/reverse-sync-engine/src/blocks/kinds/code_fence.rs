#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceKind {
    Backticks,
    Tildes,
}

/// An opening or closing fence: its character and run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceSig {
    pub kind: FenceKind,
    pub len: usize,
}

pub struct CodeFence;

impl CodeFence {
    pub const BACKTICK: char = '`';
    pub const TILDE: char = '~';
    const MIN_LEN: usize = 3;

    /// Detects a fence at the start of an already left-trimmed line.
    pub fn sig(remainder: &str) -> Option<FenceSig> {
        let t = remainder.trim_end_matches(['\r', '\n']);
        let kind = match t.chars().next()? {
            Self::BACKTICK => FenceKind::Backticks,
            Self::TILDE => FenceKind::Tildes,
            _ => return None,
        };
        let c = Self::marker(kind);
        let len = t.chars().take_while(|&ch| ch == c).count();
        (len >= Self::MIN_LEN).then_some(FenceSig { kind, len })
    }

    /// The info string after the opening fence (the code language).
    pub fn info(remainder: &str) -> &str {
        let t = remainder.trim_end_matches(['\r', '\n']);
        t.trim_start_matches([Self::BACKTICK, Self::TILDE]).trim()
    }

    /// A closing fence uses the same character, is at least as long as the
    /// opener and carries no info string.
    pub fn closes(open: FenceSig, remainder: &str) -> bool {
        match Self::sig(remainder) {
            Some(sig) => {
                sig.kind == open.kind && sig.len >= open.len && Self::info(remainder).is_empty()
            }
            None => false,
        }
    }

    /// The literal code between the fences of a fenced block's source, lines
    /// joined with `\n`. Indentation and blank lines are kept.
    pub fn body(text: &str) -> String {
        let mut lines: Vec<&str> = text.lines().collect();
        if lines.first().is_some_and(|l| Self::sig(l.trim_start()).is_some()) {
            lines.remove(0);
        }
        if lines.last().is_some_and(|l| Self::sig(l.trim_start()).is_some()) {
            lines.pop();
        }
        lines.join("\n")
    }

    fn marker(kind: FenceKind) -> char {
        match kind {
            FenceKind::Backticks => Self::BACKTICK,
            FenceKind::Tildes => Self::TILDE,
        }
    }
}

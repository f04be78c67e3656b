use std::sync::Arc;

type Pos = usize;

/// A [`SourceInfo`] records where parsed text came from, along with the byte offset
/// of the start of every line so that spans can be reported as a [`LineCol`].
#[derive(Clone, Debug)]
pub struct SourceInfo {
    source: Source,
    line_starts: Arc<Vec<Pos>>,
}

#[derive(Clone, Debug)]
pub enum Source {
    File(Arc<std::path::PathBuf>),
    String(Arc<String>),
    Unknown,
}

impl SourceInfo {
    pub fn unknown() -> SourceInfo {
        SourceInfo {
            source: Source::Unknown,
            line_starts: Arc::new(vec![0]),
        }
    }

    pub fn from_file(filepath: &std::path::Path, contents: &str) -> SourceInfo {
        SourceInfo {
            source: Source::File(Arc::new(filepath.to_owned())),
            line_starts: Arc::new(line_starts(contents)),
        }
    }

    pub fn from_string(contents: &str) -> SourceInfo {
        SourceInfo {
            source: Source::String(Arc::new(contents.to_owned())),
            line_starts: Arc::new(line_starts(contents)),
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn linecol(&self, pos: Pos) -> LineCol {
        // index of the last line starting at or before pos
        let line = self.line_starts.partition_point(|start| *start <= pos).saturating_sub(1);
        LineCol(line, pos - self.line_starts[line])
    }
}

fn line_starts(text: &str) -> Vec<Pos> {
    let mut starts = vec![0];
    for (i, ch) in text.char_indices() {
        if ch == '\n' {
            starts.push(i + 1);
        }
    }
    starts
}

/// A line and column pair. Both are zero-based internally and one-based when displayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineCol(usize, usize);

impl LineCol {
    pub fn line(&self) -> usize {
        self.0 + 1
    }

    pub fn col(&self) -> usize {
        self.1 + 1
    }
}

impl std::fmt::Display for LineCol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line(), self.col())
    }
}

/// A [`Loc`] is the span of a parsed object in its source.
#[derive(Clone)]
pub struct Loc {
    start: Pos,
    end: Pos,
    source_info: SourceInfo,
}

impl Loc {
    /// Used for objects which were not parsed from any text.
    pub fn unknown() -> Loc {
        Loc {
            start: 0,
            end: 0,
            source_info: SourceInfo::unknown(),
        }
    }

    pub fn from(source_info: &SourceInfo, start: Pos, end: Pos) -> Loc {
        Loc {
            start,
            end,
            source_info: source_info.clone(),
        }
    }

    pub fn start(&self) -> LineCol {
        self.source_info.linecol(self.start)
    }

    pub fn end(&self) -> LineCol {
        self.source_info.linecol(self.end)
    }

    /// The spanned text. Empty unless the source was a string.
    pub fn source(&self) -> &str {
        match &self.source_info.source {
            Source::String(text) => text.get(self.start..self.end).unwrap_or(""),
            _ => "",
        }
    }
}

impl std::fmt::Debug for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source_info.source {
            Source::File(path) => write!(f, "[{}:{}-{}]", path.display(), self.start(), self.end()),
            Source::String(_) => write!(f, "[{}-{} {:?}]", self.start(), self.end(), self.source()),
            Source::Unknown => write!(f, "[{}-{}]", self.start(), self.end()),
        }
    }
}

impl std::fmt::Display for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source_info.source {
            Source::File(path) => write!(f, "{}:{}", path.display(), self.start()),
            Source::String(_) => write!(f, "{}", self.start()),
            Source::Unknown => write!(f, "<unknown>"),
        }
    }
}

/// Anything which can point back at its source text.
pub trait HasLoc {
    fn loc(&self) -> Loc;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn linecol() {
        let info = SourceInfo::from_string("and p q =\n  nand ( p q )\n\nnot x = nand ( x )");
        assert_eq!(info.linecol(0).to_string(), "1:1");
        assert_eq!(info.linecol(4).to_string(), "1:5");
        assert_eq!(info.linecol(9).to_string(), "1:10");
        assert_eq!(info.linecol(10).to_string(), "2:1");
        assert_eq!(info.linecol(12).to_string(), "2:3");
        assert_eq!(info.linecol(24).to_string(), "2:15");
        assert_eq!(info.linecol(25).to_string(), "3:1");
        assert_eq!(info.linecol(26).to_string(), "4:1");
    }

    #[test]
    fn spanned_source() {
        let info = SourceInfo::from_string("f = let x = 1 in x");
        let loc = Loc::from(&info, 4, 18);
        assert_eq!(loc.source(), "let x = 1 in x");
        assert_eq!(loc.start().to_string(), "1:5");
        assert_eq!(Loc::unknown().source(), "");
    }
}

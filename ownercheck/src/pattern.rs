use std::borrow::Cow;

/// Canonicalize a path-like string for comparison: backslash separators
/// become `/`, leading `./` and `/` are stripped, trailing `/` are stripped.
/// Wildcard characters are left untouched, and normalizing an
/// already-normalized path returns it unchanged (borrowed, no allocation).
pub fn normalize(path: &str) -> Cow<'_, str> {
    if is_normalized(path) {
        return Cow::Borrowed(path);
    }
    let path = path.replace('\\', "/");
    let mut rest = path.as_str();
    loop {
        if let Some(r) = rest.strip_prefix("./") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix('/') {
            rest = r;
        } else {
            break;
        }
    }
    Cow::Owned(rest.trim_end_matches('/').to_owned())
}

fn is_normalized(path: &str) -> bool {
    !path.contains('\\')
        && !path.starts_with('/')
        && !path.starts_with("./")
        && !path.ends_with('/')
}

/// True if `path` lives strictly below the directory `prefix`. The check is
/// segment-bounded: `pkg/foo` is a prefix of `pkg/foo/bar` but not of
/// `pkg/foobar`.
fn is_path_prefix(prefix: &str, path: &str) -> bool {
    path.starts_with(prefix) && path.as_bytes().get(prefix.len()) == Some(&b'/')
}

/// A compiled ownership-rule pattern. The pattern kind is determined once,
/// from the presence of wildcard characters, rather than re-derived on every
/// match call.
#[derive(Debug, Clone)]
pub struct Pattern {
    text: String,
    kind: PatternKind,
}

#[derive(Debug, Clone)]
enum PatternKind {
    /// No wildcards. Matches the exact path, or any path below it when
    /// treated as a directory.
    Literal,
    /// Contains `*`, `?` or `**`. Matched segment-wise; a pattern with no
    /// `/` matches against the file's base name anywhere in the tree.
    Glob {
        segments: Vec<Segment>,
        /// Literal text before the first wildcard, trailing `/` stripped.
        /// Used only by relevance classification.
        literal_prefix: String,
    },
}

#[derive(Debug, Clone)]
enum Segment {
    /// `**`: zero or more whole path segments.
    AnyDepth,
    One(SegmentGlob),
}

impl Pattern {
    pub fn new(raw: &str) -> Pattern {
        let text = normalize(raw).into_owned();
        let kind = match text.find(|c| c == '*' || c == '?') {
            None => PatternKind::Literal,
            Some(idx) => {
                let literal_prefix = text[..idx].trim_end_matches('/').to_owned();
                let segments = text
                    .split('/')
                    .map(|seg| match seg {
                        "**" => Segment::AnyDepth,
                        _ => Segment::One(SegmentGlob::new(seg)),
                    })
                    .collect();
                PatternKind::Glob {
                    segments,
                    literal_prefix,
                }
            }
        };
        Pattern { text, kind }
    }

    /// The normalized pattern text, as written in the manifest modulo
    /// normalization.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_glob(&self) -> bool {
        matches!(self.kind, PatternKind::Glob { .. })
    }

    /// Whether this pattern matches the given file path. The path is
    /// normalized before comparison.
    pub fn matches(&self, path: &str) -> bool {
        let path = normalize(path);
        self.matches_normalized(&path)
    }

    fn matches_normalized(&self, path: &str) -> bool {
        match &self.kind {
            // Exact match first, then segment-bounded directory prefix:
            // a literal rule owns everything below it.
            PatternKind::Literal => path == self.text || is_path_prefix(&self.text, path),
            PatternKind::Glob { segments, .. } => {
                if !self.text.contains('/') {
                    // Unanchored single-segment glob, e.g. `*.ts`: matches by
                    // base name at any depth.
                    let name = path.rsplit('/').next().unwrap_or(path);
                    return match &segments[0] {
                        Segment::AnyDepth => true,
                        Segment::One(glob) => glob.is_match(name),
                    };
                }
                let parts: Vec<&str> = path.split('/').collect();
                glob_match(segments, &parts)
            }
        }
    }

    /// Whether this pattern could ever match a file inside `folder`, even if
    /// it currently matches none. Used to decide if an unmatched rule is
    /// worth reporting as an orphan when only a subset of a tree is being
    /// validated.
    pub fn is_relevant_to(&self, folder: &str) -> bool {
        let folder = normalize(folder);

        // The rule sits at or above the folder root, or inside the folder.
        if self.text == *folder
            || is_path_prefix(&self.text, &folder)
            || is_path_prefix(&folder, &self.text)
        {
            return true;
        }

        match &self.kind {
            PatternKind::Literal => false,
            PatternKind::Glob { literal_prefix, .. } => {
                // The glob reaches the folder itself, or its static prefix
                // sits at or above the folder. An empty static prefix means
                // the pattern starts with a wildcard and can reach anywhere.
                self.matches_normalized(&folder)
                    || literal_prefix.is_empty()
                    || *folder == *literal_prefix
                    || is_path_prefix(literal_prefix, &folder)
            }
        }
    }
}

fn glob_match(segments: &[Segment], path: &[&str]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return path.is_empty();
    };
    match first {
        Segment::AnyDepth => (0..=path.len()).any(|skip| glob_match(rest, &path[skip..])),
        Segment::One(glob) => match path.split_first() {
            Some((head, tail)) => glob.is_match(head) && glob_match(rest, tail),
            None => false,
        },
    }
}

/// Matcher for a single path segment. Most segment globs take one of a few
/// simple shapes, which are matched with plain string operations; only the
/// general case builds a regex.
#[derive(Debug, Clone)]
enum SegmentGlob {
    Any,
    Literal(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
    Regex(regex::Regex),
}

impl SegmentGlob {
    fn new(glob: &str) -> SegmentGlob {
        if glob == "*" {
            return SegmentGlob::Any;
        }

        let mut inner = glob.chars();
        let first = inner.next();
        let last = inner.next_back();
        let edge_question = first == Some('?') || last == Some('?');
        if edge_question || inner.any(|c| c == '*' || c == '?') {
            return SegmentGlob::Regex(segment_regex(glob));
        }

        match (first == Some('*'), last == Some('*')) {
            (false, false) => SegmentGlob::Literal(glob.to_owned()),
            (false, true) => SegmentGlob::Prefix(glob.trim_end_matches('*').to_owned()),
            (true, false) => SegmentGlob::Suffix(glob.trim_start_matches('*').to_owned()),
            (true, true) => SegmentGlob::Contains(glob.trim_matches('*').to_owned()),
        }
    }

    fn is_match(&self, candidate: &str) -> bool {
        match self {
            SegmentGlob::Any => true,
            SegmentGlob::Literal(text) => candidate == text,
            SegmentGlob::Prefix(prefix) => candidate.starts_with(prefix),
            SegmentGlob::Suffix(suffix) => candidate.ends_with(suffix),
            SegmentGlob::Contains(text) => {
                memchr::memmem::find(candidate.as_bytes(), text.as_bytes()).is_some()
            }
            SegmentGlob::Regex(re) => re.is_match(candidate),
        }
    }
}

fn segment_regex(glob: &str) -> regex::Regex {
    let mut source = String::with_capacity(glob.len() + 8);
    source.push_str(r"\A");
    for c in glob.chars() {
        match c {
            '*' => source.push_str("[^/]*"),
            '?' => source.push_str("[^/]"),
            c if regex_syntax::is_meta_character(c) => {
                source.push('\\');
                source.push(c);
            }
            c => source.push(c),
        }
    }
    source.push_str(r"\z");
    regex::Regex::new(&source).unwrap_or_else(|_| panic!("invalid segment regex: {}", source))
}

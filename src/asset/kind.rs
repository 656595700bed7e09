//! Asset kind definitions.

/// Kind of combinable asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Stylesheets, combined before `</head>`.
    Css,
    /// Classic scripts, combined before `</body>`.
    Js,
}

impl AssetKind {
    /// File extension of combined artifacts.
    pub const fn ext(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
        }
    }

    /// Subdirectory of the cache root.
    pub const fn dir(self) -> &'static str {
        self.ext()
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.ext())
    }
}

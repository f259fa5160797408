//! Build metadata.
//!
//! A plain-text description of everything a package was built from: the
//! port's matched config, the resolved commit, and the same for every
//! dependency, separated by divider lines. Its sha256 is the [`BuildHash`]
//! naming cache entries; comparing it with the recorded copy tells whether
//! an installed port is outdated.
//!
//! ```text
//! # -------- glog@0.6.0 <<< target --------
//! # -------- glog@0.6.0 <<< port --------
//! # -------- glog@0.6.0 <<< commit --------
//! # -------- glog@0.6.0 <<< dependency: gflags@2.2.2 <<< port --------
//! ```

use std::fmt::Write as _;

use kiln_schema::{BuildHash, PortManifest};

use crate::context::Context;
use crate::error::{KilnError, Result};
use crate::graph::{self, EdgeKind, NodeKey};
use crate::port::Port;

/// Version of kiln recorded in every metadata file.
pub const KILN_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMeta {
    content: String,
}

fn divider(out: &mut String, title: &str, what: &str) {
    let _ = writeln!(out, "\n# -------- {title} <<< {what} --------");
}

impl BuildMeta {
    /// Describe `port` and its whole dependency closure.
    pub fn compute(ctx: &Context, port: &Port) -> Result<Self> {
        let mut content = String::new();
        let title = port.name_version().to_string();

        let _ = writeln!(content, "# kiln {KILN_VERSION}");
        divider(&mut content, &title, "target");
        if port.is_host() {
            let _ = writeln!(content, "host = {:?}", ctx.host_name());
        } else {
            let _ = writeln!(content, "platform = {:?}", ctx.platform());
            let _ = writeln!(content, "project = {:?}", ctx.project().name());
            let _ = writeln!(content, "build_type = {:?}", ctx.build_type().as_str());
        }

        let mut stack = vec![port.key()];
        describe(ctx, port, &title, &mut content, &mut stack)?;
        Ok(Self { content })
    }

    /// Wrap metadata read back from disk.
    pub fn from_string(content: String) -> Self {
        Self { content }
    }

    pub fn hash(&self) -> BuildHash {
        BuildHash::of(&self.content)
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// Commit the described port was built from. The first commit section
    /// always belongs to the port itself; dependencies follow it.
    pub fn commit(&self) -> Option<&str> {
        let mut lines = self.content.lines();
        lines.find(|line| line.starts_with("# -------- ") && line.ends_with(" <<< commit --------"))?;
        lines.next().map(str::trim).filter(|c| !c.is_empty())
    }
}

fn describe(
    ctx: &Context,
    port: &Port,
    title: &str,
    out: &mut String,
    stack: &mut Vec<NodeKey>,
) -> Result<()> {
    let matched = port.matched();
    let manifest = PortManifest {
        package: matched.source.clone(),
        build_configs: vec![matched.build.clone()],
    };
    let rendered = manifest
        .to_toml()
        .map_err(|e| KilnError::context("rendering build metadata", e))?;

    divider(out, title, "port");
    out.push_str(rendered.trim_end());
    out.push('\n');

    divider(out, title, "commit");
    let _ = writeln!(out, "{}", port.commit(ctx)?);

    for edge in graph::edges(port) {
        let child = Port::init(ctx, edge.name_version, edge.flags, Some(port.name_version()))?;
        let key = child.key();
        if stack.contains(&key) {
            continue;
        }
        let label = match edge.kind {
            EdgeKind::Dev => "dev_dependency",
            EdgeKind::Runtime => "dependency",
        };
        let child_title = format!("{title} <<< {label}: {}", edge.name_version);

        stack.push(key);
        let result = describe(ctx, &child, &child_title, out, stack);
        stack.pop();
        result?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;

    #[test]
    fn test_meta_covers_dependencies() {
        let fx = Fixture::new();
        fx.port("glog@0.6.0", &["gflags@2.2.2"], &["cmake@3.30.5"]);
        fx.port("gflags@2.2.2", &[], &[]);
        fx.port("cmake@3.30.5", &[], &[]);
        let ctx = fx.context();

        let meta = BuildMeta::compute(&ctx, &fx.target(&ctx, "glog@0.6.0")).unwrap();
        let text = meta.as_str();
        assert!(text.contains("# -------- glog@0.6.0 <<< port --------"));
        assert!(text.contains("# -------- glog@0.6.0 <<< dev_dependency: cmake@3.30.5 <<< commit --------"));
        assert!(text.contains("# -------- glog@0.6.0 <<< dependency: gflags@2.2.2 <<< port --------"));
        assert!(text.contains("project = \"demo\""));
        assert_eq!(meta.hash(), BuildHash::of(text));
    }

    #[test]
    fn test_dependency_change_changes_hash() {
        let fx = Fixture::new();
        fx.port("glog@0.6.0", &["gflags@2.2.2"], &[]);
        fx.port("gflags@2.2.2", &[], &[]);
        let ctx = fx.context();
        let before = BuildMeta::compute(&ctx, &fx.target(&ctx, "glog@0.6.0")).unwrap();

        fx.port_with_options("gflags@2.2.2", &["-DBUILD_SHARED_LIBS=ON"]);
        let ctx = fx.context();
        let after = BuildMeta::compute(&ctx, &fx.target(&ctx, "glog@0.6.0")).unwrap();
        assert_ne!(before.hash(), after.hash());
    }

    #[test]
    fn test_pinned_commit_is_recorded() {
        let fx = Fixture::new();
        fx.port_pinned("zlib@1.3.1", "51b7f2abdade71cd9bb0e7a373ef2610ec6f9daf");
        let ctx = fx.context();
        let meta = BuildMeta::compute(&ctx, &fx.target(&ctx, "zlib@1.3.1")).unwrap();
        assert!(meta.as_str().contains("51b7f2abdade71cd9bb0e7a373ef2610ec6f9daf"));
        assert_eq!(meta.commit(), Some("51b7f2abdade71cd9bb0e7a373ef2610ec6f9daf"));
    }

    #[test]
    fn test_commit_belongs_to_the_port_not_its_dependencies() {
        let fx = Fixture::new();
        fx.port("glog@0.6.0", &["gflags@2.2.2"], &[]);
        fx.port_pinned("gflags@2.2.2", "e171aa2d15ed9eb17054558e0b3a6a413bb01067");
        let ctx = fx.context();
        let meta = BuildMeta::compute(&ctx, &fx.target(&ctx, "glog@0.6.0")).unwrap();
        assert_eq!(meta.commit(), Some("stub"));

        let reread = BuildMeta::from_string(meta.as_str().to_string());
        assert_eq!(reread.commit(), Some("stub"));
    }
}

// Recipe resolution phases, in execution order.
//
// Version resolution runs before tool resolution because tool hooks read the
// resolved base image version.

#[path = "01_select.rs"]
pub mod select;
#[path = "02_root_path.rs"]
pub mod root_path;
#[path = "03_process.rs"]
pub mod process;
#[path = "04_version.rs"]
pub mod version;
#[path = "05_tools.rs"]
pub mod tools;

pub use process::ProcessPhase;
pub use root_path::RootPathPhase;
pub use select::SelectStackPhase;
pub use tools::ToolsPhase;
pub use version::VersionPhase;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::fs::{MockFileSystem, ProjectTree};
    use crate::pipeline::ResolutionContext;
    use crate::sources::{MockReleaseSource, MockRuntimeIndex, MockTagSource, Sources};
    use std::sync::Arc;

    pub fn sources(
        tags: MockTagSource,
        releases: MockReleaseSource,
        runtimes: MockRuntimeIndex,
    ) -> Sources {
        Sources::new(Arc::new(tags), Arc::new(releases), Arc::new(runtimes))
    }

    pub fn offline() -> Sources {
        sources(
            MockTagSource::new(),
            MockReleaseSource::new(),
            MockRuntimeIndex::new(),
        )
    }

    pub fn context(files: &[(&str, &str)], sources: Sources) -> ResolutionContext {
        let fs = MockFileSystem::new();
        for (path, content) in files {
            fs.add_file(path, content);
        }
        ResolutionContext::new(ProjectTree::new(Arc::new(fs), "/mock"), sources)
    }
}

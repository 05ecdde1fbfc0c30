//! Tab navigation between the three screens.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Map,
    Photo,
    Library,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Map, Tab::Photo, Tab::Library];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Photo => "Photo",
            Tab::Map => "Map",
            Tab::Library => "Library",
        }
    }

    /// Subcommands that land on this tab.
    pub fn commands(&self) -> &'static [&'static str] {
        match self {
            Tab::Photo => &["capture", "import"],
            Tab::Map => &["map", "share"],
            Tab::Library => &["library", "watch", "clear", "export"],
        }
    }

    pub fn for_command(command: &str) -> Option<Tab> {
        Self::ALL
            .into_iter()
            .find(|tab| tab.commands().contains(&command))
    }

    pub fn next(&self) -> Tab {
        match self {
            Tab::Map => Tab::Photo,
            Tab::Photo => Tab::Library,
            Tab::Library => Tab::Map,
        }
    }
}

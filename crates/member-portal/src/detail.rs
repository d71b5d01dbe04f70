use arbor_core::{surface_for, BuildError, Builder, Controller, Node, Scope};

/// Full-screen leaf shown over a feature tab.
pub struct DetailController {
    title: String,
}

impl DetailController {
    pub fn title(&self) -> &str {
        &self.title
    }
}

impl Controller for DetailController {
    type Event = ();
}

pub struct DetailBuilder;

impl Builder for DetailBuilder {
    type Args = String;

    fn kind(&self) -> &'static str {
        "detail"
    }

    fn build(&self, parent: &Scope, title: String) -> Result<Node, BuildError> {
        if title.trim().is_empty() {
            return Err(BuildError::InvalidArgument {
                node: "detail",
                reason: "title must not be empty".into(),
            });
        }
        let scope = parent.extend("detail").build();
        let surface = surface_for(&scope, "detail");
        Ok(Node::new("detail", scope, surface, DetailController { title }))
    }
}

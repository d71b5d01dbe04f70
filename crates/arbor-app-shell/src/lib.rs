use arbor_core::{
    surface_for, Builder, PumpStats, SavedState, Scope, Surface, Tree, TreeError,
};
use arbor_runtime_std::StdRuntime;

/// What the platform should do after a back press went through the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    /// Some node handled it.
    Consumed,
    /// Nothing in the tree wanted it; apply the platform default.
    PlatformDefault,
}

/// Bridges platform lifecycle into a [`Tree`].
///
/// Foregrounding launches the root (restoring saved state when the platform
/// hands some back), backgrounding captures state and tears the tree down,
/// and `update` pumps the tree whenever the runtime asked for it.
pub struct AppShell<B>
where
    B: Builder,
    B::Args: Clone,
{
    runtime: StdRuntime,
    tree: Tree,
    builder: B,
    args: B::Args,
}

impl<B> AppShell<B>
where
    B: Builder,
    B::Args: Clone,
{
    /// The window surface comes from the scope's surface factory.
    pub fn new(builder: B, args: B::Args, scope: Scope) -> Self {
        let window = surface_for(&scope, "window");
        Self::with_window(builder, args, scope, window)
    }

    pub fn with_window(builder: B, args: B::Args, scope: Scope, window: Box<dyn Surface>) -> Self {
        let runtime = StdRuntime::new();
        let tree = Tree::new(runtime.runtime(), scope, window);
        Self {
            runtime,
            tree,
            builder,
            args,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn runtime(&self) -> &StdRuntime {
        &self.runtime
    }

    pub fn is_foreground(&self) -> bool {
        self.tree.is_launched()
    }

    /// Launches the root and settles it. A shell that is already in the
    /// foreground ignores the call.
    pub fn on_foreground(&mut self, saved: Option<SavedState>) -> Result<(), TreeError> {
        if self.tree.is_launched() {
            log::debug!("already in the foreground");
            return Ok(());
        }
        log::info!(
            "foreground: launching {}{}",
            self.builder.kind(),
            if saved.is_some() { " from saved state" } else { "" }
        );
        self.tree.launch(&self.builder, self.args.clone(), saved)?;
        self.settle()?;
        Ok(())
    }

    /// Captures state and tears the tree down. Returns `None` when the shell
    /// was not in the foreground.
    pub fn on_background(&mut self) -> Option<SavedState> {
        let saved = self.tree.shutdown();
        if saved.is_some() {
            log::info!("background: tree saved and torn down");
        }
        saved
    }

    pub fn back_pressed(&mut self) -> Result<BackOutcome, TreeError> {
        let consumed = self.tree.handle_back_press()?;
        self.settle()?;
        Ok(if consumed {
            BackOutcome::Consumed
        } else {
            log::debug!("back press not consumed; falling back to the platform");
            BackOutcome::PlatformDefault
        })
    }

    /// Queues an event for the node at `path`; it is delivered on the next
    /// `update`.
    pub fn send<E: 'static>(&mut self, path: &str, event: E) -> Result<(), TreeError> {
        self.tree.send(path, event)
    }

    pub fn should_update(&self) -> bool {
        self.runtime.scheduler().pump_requested() || !self.tree.is_idle()
    }

    /// Pumps the tree if the runtime requested it since the last update. A
    /// controller error stops the pump and is handed back to the host.
    pub fn update(&mut self) -> Result<PumpStats, TreeError> {
        let requested = self.runtime.take_pump_request();
        if !requested && self.tree.is_idle() {
            return Ok(PumpStats::default());
        }
        self.settle().map_err(|err| {
            log::error!("pump failed: {err}");
            err
        })
    }

    fn settle(&mut self) -> Result<PumpStats, TreeError> {
        let stats = self.tree.pump()?;
        if self.tree.is_idle() {
            // Requests raised while pumping were served by that same pump.
            self.runtime.take_pump_request();
        }
        Ok(stats)
    }

    pub fn dump(&self) -> String {
        self.tree.dump()
    }
}

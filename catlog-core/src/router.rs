use std::{
    collections::HashMap,
    sync::{
        Arc, LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::{config::CATLOG_CONFIG, level::Level, record::Record, sink::Sink};

/// Receiver of the router's own diagnostic lines.
pub type Diagnostics = Arc<dyn Fn(&str) + Send + Sync>;

/// Process-wide root router, created on first use.
static GLOBAL_ROUTER: LazyLock<Arc<Router>> = LazyLock::new(|| {
    let router = Router::new();
    router.set_default_category(CATLOG_CONFIG.default_category());
    Arc::new(router)
});

#[derive(Default)]
struct RouterState {
    global_sinks: Vec<Arc<dyn Sink>>,
    category_sinks: HashMap<String, Vec<Arc<dyn Sink>>>,
    forward_to_global: HashMap<String, bool>,
    default_category: Option<String>,
}

/// What happened to a record within the tiers visited so far.
#[derive(Debug, Default, Clone, Copy)]
struct Routing {
    /// At least one sink received the record.
    delivered: bool,
    /// The record was addressed to some sink set, even an empty one.
    routed: bool,
}

/// Routes records to sinks by category.
///
/// A router keeps an ordered set of global sinks plus sink sets per category.
/// A record goes to the sinks of its category, and additionally to the global
/// sinks when it has no category, belongs to the default category, or its
/// category is forwarded to the global sinks.
///
/// Routers are either roots ([`Router::new`], [`Router::global`]) or attached
/// to a root ([`Router::attached`], [`Router::scoped`]). An attached router
/// keeps its own sinks and default category, and re-dispatches every record
/// with a category (explicit or its default) to the root, so independent
/// subsystems share one set of sinks while scoping what they see. A record
/// that no tier delivers gets the fallback line.
///
/// Configuration problems never fail a log call: they are reported on the
/// diagnostics channel (stderr unless replaced with
/// [`Router::with_diagnostics`]). A [`Level::Fatal`] record aborts the process
/// after every matched sink has received it.
pub struct Router {
    state: RwLock<RouterState>,
    root: Option<Arc<Router>>,
    diagnostics: Diagnostics,
    no_sinks_reported: AtomicBool,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates an isolated root router.
    pub fn new() -> Self {
        Self::build(None, Arc::new(|line: &str| eprintln!("{line}")))
    }

    /// Creates a router that re-dispatches categorised records to `root`.
    /// Attaching to an attached router attaches to its root.
    pub fn attached(root: Arc<Router>) -> Self {
        let root = match &root.root {
            Some(parent) => Arc::clone(parent),
            None => root,
        };
        let diagnostics = Arc::clone(&root.diagnostics);
        Self::build(Some(root), diagnostics)
    }

    /// The process-wide root router.
    pub fn global() -> Arc<Router> {
        Arc::clone(&GLOBAL_ROUTER)
    }

    /// Creates a router attached to the process-wide one.
    pub fn scoped() -> Self {
        Self::attached(Self::global())
    }

    /// Sends diagnostic lines to `diagnostics` instead of stderr.
    pub fn with_diagnostics<F>(self, diagnostics: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            diagnostics: Arc::new(diagnostics),
            ..self
        }
    }

    fn build(root: Option<Arc<Router>>, diagnostics: Diagnostics) -> Self {
        Self {
            state: RwLock::new(RouterState::default()),
            root,
            diagnostics,
            no_sinks_reported: AtomicBool::new(false),
        }
    }

    pub fn is_root(&self) -> bool {
        self.root.is_none()
    }

    /// Adds `sink` to the global sinks, or to the sinks of `category`.
    /// Registering the same sink twice in one set is reported and ignored.
    pub fn register_sink(&self, sink: Arc<dyn Sink>, category: Option<&str>) {
        let mut state = self.write();
        let sinks = match category {
            None => &mut state.global_sinks,
            Some(category) => state
                .category_sinks
                .entry(category.to_string())
                .or_default(),
        };
        if sinks.iter().any(|registered| same_sink(registered, &sink)) {
            drop(state);
            self.report("catlog: trying to register a sink that is already registered");
        } else {
            sinks.push(sink);
        }
    }

    /// Number of sinks registered globally, or for `category`.
    pub fn sink_count(&self, category: Option<&str>) -> usize {
        let state = self.read();
        match category {
            None => state.global_sinks.len(),
            Some(category) => state.category_sinks.get(category).map_or(0, Vec::len),
        }
    }

    pub fn set_default_category(&self, category: Option<&str>) {
        self.write().default_category = category.map(str::to_string);
    }

    pub fn default_category(&self) -> Option<String> {
        self.read().default_category.clone()
    }

    /// Makes records of `category` also reach the global sinks. On an
    /// attached router this configures its root.
    pub fn set_forward(&self, category: &str, enabled: bool) {
        match &self.root {
            Some(root) => root.set_forward(category, enabled),
            None => {
                self.write()
                    .forward_to_global
                    .insert(category.to_string(), enabled);
            }
        }
    }

    pub fn is_forwarded(&self, category: &str) -> bool {
        match &self.root {
            Some(root) => root.is_forwarded(category),
            None => self.read().forward_to_global.get(category).copied().unwrap_or(false),
        }
    }

    /// Delivers `record` to every matched sink, in registration order.
    ///
    /// When no sink received a record that was addressed to some sink set, or
    /// that came through an attached router, a one-line fallback is written to
    /// the diagnostics channel instead. A
    /// fatal record aborts the process once delivery is done.
    pub fn dispatch(&self, record: &Record<'_>) {
        let routing = self.route(record, false);
        if routing.routed && !routing.delivered {
            self.report(&fallback_line(record));
        }
        if record.level() == Level::Fatal {
            self.flush();
            if let Some(root) = &self.root {
                root.flush();
            }
            std::process::abort();
        }
    }

    /// Routes within this tier, then through the root for attached routers.
    /// `from_attached` is set when an attached router passes the record on;
    /// the fallback decision then belongs to that router.
    fn route(&self, record: &Record<'_>, from_attached: bool) -> Routing {
        // a record logged through an attached router is always expected somewhere
        let mut routing = Routing {
            delivered: false,
            routed: !self.is_root(),
        };
        let state = self.read();
        let default_category = state.default_category.as_deref();
        let category = record.category().or(default_category);
        let is_default = category.is_some() && category == default_category;
        let forwarded = self.is_root()
            && category.is_some_and(|category| {
                state.forward_to_global.get(category).copied().unwrap_or(false)
            });

        if let Some(category) = category {
            match state.category_sinks.get(category) {
                Some(sinks) if !sinks.is_empty() => {
                    for sink in sinks {
                        sink.write(record);
                    }
                    routing.delivered = true;
                    routing.routed = true;
                }
                _ => {
                    if self.is_root() && !is_default && !forwarded && !from_attached {
                        self.report(&format!(
                            "catlog: no sink registered for category \"{category}\""
                        ));
                    }
                }
            }
        }

        if category.is_none() || is_default || forwarded {
            if state.global_sinks.is_empty() {
                // attached routers usually have no global sinks of their own
                if self.is_root() {
                    routing.routed = true;
                    if !self.no_sinks_reported.swap(true, Ordering::Relaxed) {
                        self.report("catlog: no sinks registered with logger");
                    }
                }
            } else {
                routing.routed = true;
                for sink in &state.global_sinks {
                    sink.write(record);
                }
                routing.delivered = true;
            }
        }

        let forward = self.root.as_ref().zip(category.map(str::to_string));
        drop(state);
        if let Some((root, category)) = forward {
            let record = record.with_category(Some(&category));
            let upstream = root.route(&record, true);
            routing.delivered |= upstream.delivered;
            routing.routed |= upstream.routed;
        }
        routing
    }

    /// Flushes every registered sink.
    pub fn flush(&self) {
        let state = self.read();
        for sink in all_sinks(&state) {
            sink.flush();
        }
    }

    /// Flushes and releases every sink and forgets all routing rules.
    pub fn clear(&self) {
        let released = {
            let mut state = self.write();
            std::mem::take(&mut *state)
        };
        for sink in all_sinks(&released) {
            sink.flush();
        }
    }

    fn report(&self, line: &str) {
        (self.diagnostics)(line);
    }

    fn read(&self) -> RwLockReadGuard<'_, RouterState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RouterState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn all_sinks(state: &RouterState) -> impl Iterator<Item = &Arc<dyn Sink>> {
    state
        .global_sinks
        .iter()
        .chain(state.category_sinks.values().flatten())
}

fn same_sink(a: &Arc<dyn Sink>, b: &Arc<dyn Sink>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn fallback_line(record: &Record<'_>) -> String {
    format!(
        "[{:<7}] <{}> {}",
        record.level(),
        record.function(),
        record.message()
    )
}

/// Releases the sinks of a router when dropped. Hold it for the lifetime of
/// your logging session.
#[must_use = "dropping the guard releases every sink of the router"]
pub struct LoggerGuard {
    router: Arc<Router>,
}

impl LoggerGuard {
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        self.router.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Location;
    use std::{
        sync::{Mutex, atomic::AtomicUsize},
        thread,
    };

    type Journal = Arc<Mutex<Vec<String>>>;

    struct RecordingSink {
        name: &'static str,
        journal: Journal,
        flushes: AtomicUsize,
    }

    impl RecordingSink {
        fn new(name: &'static str, journal: &Journal) -> Arc<Self> {
            Arc::new(Self {
                name,
                journal: Arc::clone(journal),
                flushes: AtomicUsize::new(0),
            })
        }
    }

    impl Sink for RecordingSink {
        fn write(&self, record: &Record<'_>) {
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, record.message()));
        }

        fn flush(&self) {
            self.flushes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn capturing_router() -> (Router, Journal) {
        let lines = Journal::default();
        let captured = Arc::clone(&lines);
        let router = Router::new()
            .with_diagnostics(move |line: &str| captured.lock().unwrap().push(line.to_string()));
        (router, lines)
    }

    fn record<'a>(category: Option<&'a str>, message: &'a str) -> Record<'a> {
        Record::new(Level::Info, Location::new("main.rs", 3, "main"), message)
            .with_category(category)
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal.lock().unwrap().clone()
    }

    #[test]
    fn test_duplicate_registration_is_reported_and_ignored() {
        let (router, diagnostics) = capturing_router();
        let journal = Journal::default();
        let sink = RecordingSink::new("a", &journal);
        router.register_sink(sink.clone(), None);
        router.register_sink(sink.clone(), None);
        assert_eq!(router.sink_count(None), 1);
        assert_eq!(
            entries(&diagnostics),
            vec!["catlog: trying to register a sink that is already registered"]
        );

        router.dispatch(&record(None, "hello"));
        assert_eq!(entries(&journal), vec!["a:hello"]);

        // the same sink may still serve a category
        router.register_sink(sink, Some("net"));
        assert_eq!(router.sink_count(Some("net")), 1);
    }

    #[test]
    fn test_forwarded_category_reaches_both_sets_in_order() {
        let (router, diagnostics) = capturing_router();
        let journal = Journal::default();
        router.register_sink(RecordingSink::new("net1", &journal), Some("net"));
        router.register_sink(RecordingSink::new("g1", &journal), None);
        router.register_sink(RecordingSink::new("net2", &journal), Some("net"));
        router.register_sink(RecordingSink::new("g2", &journal), None);

        router.dispatch(&record(Some("net"), "scoped"));
        assert_eq!(entries(&journal), vec!["net1:scoped", "net2:scoped"]);

        journal.lock().unwrap().clear();
        router.set_forward("net", true);
        assert!(router.is_forwarded("net"));
        router.dispatch(&record(Some("net"), "both"));
        assert_eq!(
            entries(&journal),
            vec!["net1:both", "net2:both", "g1:both", "g2:both"]
        );
        assert!(entries(&diagnostics).is_empty());
    }

    #[test]
    fn test_unregistered_category_produces_one_diagnostic() {
        let (router, diagnostics) = capturing_router();
        let journal = Journal::default();
        router.register_sink(RecordingSink::new("g", &journal), None);

        router.dispatch(&record(Some("db"), "lost"));
        assert!(entries(&journal).is_empty());
        assert_eq!(
            entries(&diagnostics),
            vec!["catlog: no sink registered for category \"db\""]
        );
    }

    #[test]
    fn test_default_category_goes_to_global_sinks() {
        let (router, diagnostics) = capturing_router();
        let journal = Journal::default();
        router.register_sink(RecordingSink::new("app", &journal), Some("app"));
        router.register_sink(RecordingSink::new("g", &journal), None);
        router.set_default_category(Some("app"));
        assert_eq!(router.default_category().as_deref(), Some("app"));

        router.dispatch(&record(None, "implicit"));
        router.dispatch(&record(Some("app"), "explicit"));
        assert_eq!(
            entries(&journal),
            vec!["app:implicit", "g:implicit", "app:explicit", "g:explicit"]
        );
        assert!(entries(&diagnostics).is_empty());
    }

    #[test]
    fn test_missing_sinks_fall_back_to_diagnostics() {
        let (router, diagnostics) = capturing_router();
        router.dispatch(&record(None, "first"));
        router.dispatch(&record(None, "second"));
        assert_eq!(
            entries(&diagnostics),
            vec![
                "catlog: no sinks registered with logger",
                "[Info   ] <main> first",
                "[Info   ] <main> second",
            ]
        );
    }

    #[test]
    fn test_attached_router_shares_root_sinks() {
        let (root, diagnostics) = capturing_router();
        let root = Arc::new(root);
        let journal = Journal::default();
        root.register_sink(RecordingSink::new("g", &journal), None);
        root.register_sink(RecordingSink::new("net", &journal), Some("net"));

        let scoped = Router::attached(Arc::clone(&root));
        assert!(!scoped.is_root());
        scoped.set_default_category(Some("net"));
        scoped.dispatch(&record(None, "from subsystem"));
        assert_eq!(entries(&journal), vec!["net:from subsystem"]);

        journal.lock().unwrap().clear();
        scoped.set_forward("net", true);
        assert!(root.is_forwarded("net"));
        scoped.dispatch(&record(None, "forwarded"));
        assert_eq!(entries(&journal), vec!["net:forwarded", "g:forwarded"]);

        // uncategorised records of the root are unaffected
        journal.lock().unwrap().clear();
        root.dispatch(&record(None, "plain"));
        assert_eq!(entries(&journal), vec!["g:plain"]);
        assert!(entries(&diagnostics).is_empty());
    }

    #[test]
    fn test_attached_router_delivers_in_both_tiers() {
        let (root, diagnostics) = capturing_router();
        let root = Arc::new(root);
        let journal = Journal::default();
        let scoped = Router::attached(Arc::clone(&root));
        scoped.register_sink(RecordingSink::new("local", &journal), Some("ui"));
        scoped.dispatch(&record(Some("ui"), "click"));
        assert_eq!(entries(&journal), vec!["local:click"]);
        // the root never reports categories of attached routers
        assert!(entries(&diagnostics).is_empty());

        root.register_sink(RecordingSink::new("root", &journal), Some("ui"));
        scoped.dispatch(&record(Some("ui"), "again"));
        assert_eq!(
            entries(&journal),
            vec!["local:click", "local:again", "root:again"]
        );

        scoped.dispatch(&record(Some("nowhere"), "dropped"));
        assert_eq!(entries(&diagnostics), vec!["[Info   ] <main> dropped"]);
    }

    #[test]
    fn test_attached_default_category_undelivered_falls_back() {
        let (root, diagnostics) = capturing_router();
        let root = Arc::new(root);
        let journal = Journal::default();
        root.register_sink(RecordingSink::new("g", &journal), None);
        let scoped = Router::attached(Arc::clone(&root));
        scoped.set_default_category(Some("net"));

        scoped.dispatch(&record(None, "unheard"));
        assert!(entries(&journal).is_empty());
        assert_eq!(entries(&diagnostics), vec!["[Info   ] <main> unheard"]);
    }

    #[test]
    fn test_attached_uncategorised_record_stays_local() {
        let (root, diagnostics) = capturing_router();
        let root = Arc::new(root);
        let journal = Journal::default();
        root.register_sink(RecordingSink::new("root", &journal), None);
        let scoped = Router::attached(Arc::clone(&root));
        scoped.register_sink(RecordingSink::new("local", &journal), None);

        scoped.dispatch(&record(None, "plain"));
        assert_eq!(entries(&journal), vec!["local:plain"]);

        // without local sinks nothing reaches the root either
        let bare = Router::attached(Arc::clone(&root));
        bare.dispatch(&record(None, "lost"));
        assert_eq!(entries(&journal), vec!["local:plain"]);
        assert_eq!(entries(&diagnostics), vec!["[Info   ] <main> lost"]);
    }

    #[test]
    fn test_attaching_to_attached_router_uses_its_root() {
        let root = Arc::new(Router::new());
        let first = Arc::new(Router::attached(Arc::clone(&root)));
        let second = Router::attached(first);
        second.set_forward("x", true);
        assert!(root.is_forwarded("x"));
    }

    #[test]
    fn test_clear_flushes_and_releases_sinks() {
        let router = Arc::new(Router::new());
        let journal = Journal::default();
        let global = RecordingSink::new("g", &journal);
        let scoped = RecordingSink::new("s", &journal);
        router.register_sink(global.clone(), None);
        router.register_sink(scoped.clone(), Some("s"));
        router.set_forward("s", true);

        drop(LoggerGuard::new(Arc::clone(&router)));
        assert_eq!(router.sink_count(None), 0);
        assert_eq!(router.sink_count(Some("s")), 0);
        assert!(!router.is_forwarded("s"));
        assert_eq!(global.flushes.load(Ordering::SeqCst), 1);
        assert_eq!(scoped.flushes.load(Ordering::SeqCst), 1);
        assert_eq!(Arc::strong_count(&global), 1);
    }

    #[test]
    fn test_concurrent_dispatch_and_registration() {
        let router = Arc::new(Router::new().with_diagnostics(|_: &str| {}));
        let journal = Journal::default();
        router.register_sink(RecordingSink::new("g", &journal), None);
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let router = Arc::clone(&router);
                let journal = Arc::clone(&journal);
                thread::spawn(move || {
                    if i == 0 {
                        router.register_sink(RecordingSink::new("late", &journal), Some("w"));
                    }
                    for n in 0..100 {
                        router.dispatch(&record(None, &format!("{i}-{n}")));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(entries(&journal).len(), 800);
        assert_eq!(router.sink_count(Some("w")), 1);
    }
}

//! WebAssembly bindings for Curtain Fall

mod dom;
mod logger;

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, MutationObserver, MutationObserverInit, Node};

use cf_compiler::{compile_filter_list, generate_network_rules, CompileStats, NetworkRule, RuleIdAllocator};
use cf_core::{
    reconcile::ChangeAction,
    removal::removal_name_for_host,
    store::StoreState,
    FilterRule, MemoryRemovalStore, PassOutcome, Reconciler, ReconcilerConfig, RemovalSpec,
};

pub use dom::WebDom;

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, MutationObserver)>;

#[wasm_bindgen]
pub fn init_logging(verbose: bool) {
    logger::install(verbose);
}

fn js_error(message: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&message.to_string())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let text = serde_json::to_string(value).map_err(js_error)?;
    js_sys::JSON::parse(&text)
}

fn parse_state(storage_json: &str) -> Result<StoreState, serde_json::Error> {
    if storage_json.trim().is_empty() {
        return Ok(StoreState::default());
    }
    serde_json::from_str(storage_json)
}

// ============================================================================
// Content script
// ============================================================================

/// Page-side engine: runs a pass on start and after every DOM mutation.
#[wasm_bindgen]
pub struct ContentScript {
    engine: Rc<RefCell<Reconciler>>,
    store: MemoryRemovalStore,
    root: Node,
    observer: Option<(MutationObserver, ObserverCallback)>,
}

#[wasm_bindgen]
impl ContentScript {
    /// `storage_json` is the extension storage object (`userRemovals`,
    /// `enabledDefaultRemovals`, `extensionEnabled`); missing keys take defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(storage_json: &str) -> Result<ContentScript, JsValue> {
        let window = web_sys::window().ok_or_else(|| js_error("No window"))?;
        let document = window.document().ok_or_else(|| js_error("No document"))?;
        let hostname = window.location().hostname().unwrap_or_default();

        let state = parse_state(storage_json).map_err(|e| js_error(format!("Invalid storage: {e}")))?;
        let store = MemoryRemovalStore::from_state(state);
        let engine = Reconciler::from_store(ReconcilerConfig::for_host(hostname), &store);

        Ok(Self {
            engine: Rc::new(RefCell::new(engine)),
            store,
            root: document.into(),
            observer: None,
        })
    }

    /// Run a full pass and start observing the document. No-op when the
    /// extension is switched off or already observing.
    pub fn start(&mut self) -> Result<(), JsValue> {
        if self.observer.is_some() || !self.engine.borrow().is_enabled() {
            return Ok(());
        }

        self.run();

        let engine = Rc::clone(&self.engine);
        let root = self.root.clone();
        let callback = ObserverCallback::new(move |_records: js_sys::Array, _observer: MutationObserver| {
            match engine.try_borrow() {
                Ok(engine) => {
                    engine.run(&WebDom, &root);
                }
                Err(_) => log::debug!("engine busy, mutation batch skipped"),
            }
        });

        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);

        let target = self
            .root
            .dyn_ref::<Document>()
            .and_then(|document| document.document_element())
            .ok_or_else(|| js_error("Document has no root element"))?;
        observer.observe_with_options(&target, &options)?;

        self.observer = Some((observer, callback));
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some((observer, _callback)) = self.observer.take() {
            observer.disconnect();
        }
    }

    pub fn is_observing(&self) -> bool {
        self.observer.is_some()
    }

    /// Run one pass now. Returns the pass counters, or `null` when the pass
    /// did not run.
    pub fn run(&self) -> JsValue {
        let outcome = match self.engine.try_borrow() {
            Ok(engine) => engine.run(&WebDom, &self.root),
            Err(_) => PassOutcome::Busy,
        };

        let PassOutcome::Applied(report) = outcome else {
            return JsValue::NULL;
        };

        let result = js_sys::Object::new();
        let _ = js_sys::Reflect::set(&result, &"elementsRemoved".into(), &JsValue::from(report.elements_removed as u32));
        let _ = js_sys::Reflect::set(&result, &"classesRemoved".into(), &JsValue::from(report.classes_removed as u32));
        let _ = js_sys::Reflect::set(&result, &"stylesSet".into(), &JsValue::from(report.styles_set as u32));
        let _ = js_sys::Reflect::set(&result, &"selectorErrors".into(), &JsValue::from(report.selector_errors as u32));
        result.into()
    }

    /// Storage change event. `key` is the changed storage key and
    /// `storage_json` the full storage object after the change.
    pub fn on_storage_change(&mut self, key: &str, storage_json: &str) -> Result<(), JsValue> {
        let state = parse_state(storage_json).map_err(|e| js_error(format!("Invalid storage: {e}")))?;
        self.store = MemoryRemovalStore::from_state(state);

        let action = self.engine.borrow_mut().handle_change(key, &self.store);
        match action {
            ChangeAction::Reloaded => {
                self.run();
            }
            ChangeAction::Switched(true) => self.start()?,
            ChangeAction::Switched(false) => self.stop(),
            ChangeAction::Ignored => {}
        }
        Ok(())
    }

    /// Replace the blocking-list rules. `rules_json` is an array of filter
    /// rules; only element rules for this page are kept.
    pub fn set_filter_rules(&mut self, rules_json: &str) -> Result<(), JsValue> {
        let rules: Vec<FilterRule> =
            serde_json::from_str(rules_json).map_err(|e| js_error(format!("Invalid rules: {e}")))?;
        self.engine.borrow_mut().reload_filter_rules(rules);
        self.run();
        Ok(())
    }

    pub fn hostname(&self) -> String {
        self.engine.borrow().hostname().to_string()
    }
}

impl Drop for ContentScript {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// Element picker
// ============================================================================

#[wasm_bindgen]
pub fn synthesize_selector(element: &Element) -> String {
    let node: &Node = element.as_ref();
    cf_core::synthesize(&WebDom, node)
}

/// Draft removal spec for a picked element, as a plain object.
#[wasm_bindgen]
pub fn draft_removal(
    element: &Element,
    hostname: Option<String>,
    description: Option<String>,
) -> Result<JsValue, JsValue> {
    let spec = draft_spec(synthesize_selector(element), hostname.as_deref(), description);
    to_js(&spec)
}

fn draft_spec(selector: String, hostname: Option<&str>, description: Option<String>) -> RemovalSpec {
    RemovalSpec::draft(
        uuid::Uuid::new_v4().to_string(),
        removal_name_for_host(hostname),
        selector,
        description,
    )
}

// ============================================================================
// Filter list compilation
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompiledList {
    rules: Vec<FilterRule>,
    network_rules: Vec<NetworkRule>,
    lines: usize,
    comments: usize,
    skipped: usize,
    exceptions: usize,
    suppressed: usize,
    deduped: usize,
}

fn compile_list(text: &str, taken_rule_ids: Vec<u32>) -> CompiledList {
    let (rules, stats): (Vec<FilterRule>, CompileStats) = compile_filter_list(text);
    let mut ids = RuleIdAllocator::after(taken_rule_ids);
    let network_rules = generate_network_rules(&rules, &mut ids);

    CompiledList {
        network_rules,
        lines: stats.parse.lines,
        comments: stats.parse.comments,
        skipped: stats.parse.skipped,
        exceptions: stats.parse.exceptions,
        suppressed: stats.suppressed,
        deduped: stats.deduped,
        rules,
    }
}

/// Compile a downloaded list. Network rule ids start above `taken_rule_ids`.
#[wasm_bindgen]
pub fn compile_list_text(text: &str, taken_rule_ids: Vec<u32>) -> Result<JsValue, JsValue> {
    to_js(&compile_list(text, taken_rule_ids))
}

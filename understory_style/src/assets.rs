// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred resolution of asset paths declared by styles.
//!
//! A path is either a plain resource path, loaded through the host
//! [`ResourceLoader`], or `"bundle|asset"`. A bundle path whose bundle is not yet
//! registered parks the style on that bundle's waiting list; registering the
//! bundle resolves every waiting style that is still alive and drops the list.
//!
//! Bundle downloads are polled once per frame with [`AssetRegistry::poll`]. The
//! in-flight table sits behind a lock since hosts start downloads and poll them
//! from different callbacks.

use core::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, error, warn};

use crate::state::AssetKind;
use crate::style::{Style, StyleRef};
use crate::types::{AssetId, StylePropertyType, StyleStateType};

/// Host loader for plain resource paths.
pub trait ResourceLoader {
    /// Load a texture, `None` if it does not exist.
    fn load_texture(&self, path: &str) -> Option<AssetId>;
    /// Load a font, `None` if it does not exist.
    fn load_font(&self, path: &str) -> Option<AssetId>;
}

/// A loaded asset bundle.
pub trait AssetBundle {
    /// Load a texture by asset name.
    fn load_texture(&self, name: &str) -> Option<AssetId>;
    /// Load a font by asset name.
    fn load_font(&self, name: &str) -> Option<AssetId>;
    /// Release the bundle's resources.
    fn unload(&self) {}
}

/// An in-flight bundle download.
pub trait BundleDownload {
    /// Whether the download has finished, successfully or not.
    fn is_done(&self) -> bool;
    /// Progress in `[0, 1]`.
    fn progress(&self) -> f32;
    /// The downloaded bundle, `None` if the download produced none.
    fn take_bundle(&mut self) -> Option<Rc<dyn AssetBundle>>;
}

/// Called with the bundle name once a download finishes.
pub type LoadCompleted = Box<dyn FnOnce(&str)>;

struct InFlight {
    name: String,
    download: Box<dyn BundleDownload>,
    on_complete: Option<LoadCompleted>,
}

#[derive(Default)]
struct Downloads {
    in_flight: Vec<InFlight>,
    finished: usize,
}

/// Registered bundles, waiting styles, and in-flight downloads.
pub struct AssetRegistry {
    loader: Box<dyn ResourceLoader>,
    bundles: RefCell<FxHashMap<String, Rc<dyn AssetBundle>>>,
    waiting: RefCell<FxHashMap<String, Vec<Weak<RefCell<Style>>>>>,
    downloads: Mutex<Downloads>,
    accumulated: Cell<f32>,
}

impl core::fmt::Debug for AssetRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut bundles: Vec<String> = self.bundles.borrow().keys().cloned().collect();
        bundles.sort();
        f.debug_struct("AssetRegistry")
            .field("bundles", &bundles)
            .field("waiting", &self.waiting.borrow().len())
            .field("in_flight", &self.downloads.lock().in_flight.len())
            .finish_non_exhaustive()
    }
}

struct Resolution {
    state: StyleStateType,
    property: StylePropertyType,
    asset: AssetId,
}

impl AssetRegistry {
    /// Registry loading plain paths through `loader`.
    pub fn new(loader: impl ResourceLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            bundles: RefCell::default(),
            waiting: RefCell::default(),
            downloads: Mutex::default(),
            accumulated: Cell::new(0.0),
        }
    }

    /// Whether a bundle called `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.bundles.borrow().contains_key(name)
    }

    /// The registered bundle called `name`.
    pub fn get(&self, name: &str) -> Option<Rc<dyn AssetBundle>> {
        let bundle = self.bundles.borrow().get(name).cloned();
        if bundle.is_none() {
            warn!(bundle = name, "no bundle registered under this name");
        }
        bundle
    }

    /// Register a bundle and resolve every style waiting on it.
    ///
    /// Returns `false` if a bundle with that name is already registered.
    pub fn register(&self, name: &str, bundle: Rc<dyn AssetBundle>) -> bool {
        if self.contains(name) {
            return false;
        }
        self.bundles.borrow_mut().insert(name.to_owned(), bundle);
        let waiting = self.waiting.borrow_mut().remove(name).unwrap_or_default();
        debug!(bundle = name, waiting = waiting.len(), "bundle registered");
        for style in waiting.iter().filter_map(Weak::upgrade) {
            self.check_load_assets_from(name, &style);
        }
        true
    }

    /// Unload and forget a bundle. Returns `false` if it was not registered.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.bundles.borrow_mut().remove(name);
        match removed {
            Some(bundle) => {
                bundle.unload();
                true
            }
            None => false,
        }
    }

    /// Unload and forget every bundle.
    pub fn unregister_all(&self) {
        let bundles: Vec<_> = self.bundles.borrow_mut().drain().collect();
        for (_, bundle) in bundles {
            bundle.unload();
        }
    }

    /// Number of live styles waiting on `bundle`.
    pub fn waiting_count(&self, bundle: &str) -> usize {
        self.waiting
            .borrow()
            .get(bundle)
            .map_or(0, |list| list.iter().filter(|w| w.strong_count() > 0).count())
    }

    /// Resolve every declared asset path of `style`.
    pub fn check_load_assets(&self, style: &StyleRef) {
        self.resolve_matching(style, |_| true);
    }

    /// Resolve only the paths of `style` that point into `bundle`.
    pub fn check_load_assets_from(&self, bundle: &str, style: &StyleRef) {
        self.resolve_matching(style, |path| {
            path.split_once('|').is_some_and(|(b, _)| b == bundle)
        });
    }

    /// Copy a style and resolve the copy's paths.
    pub fn copy_style(&self, style: &StyleRef) -> StyleRef {
        let copy = style.borrow().copy().into_ref();
        self.check_load_assets(&copy);
        copy
    }

    fn resolve_matching(&self, style: &StyleRef, filter: impl Fn(&str) -> bool) {
        let mut resolved = Vec::new();
        {
            let s = style.borrow();
            for state in StyleStateType::ALL {
                for (property, kind, path) in s.state(state).asset_paths() {
                    if !filter(path) {
                        continue;
                    }
                    if let Some(asset) = self.load(style, kind, path) {
                        resolved.push(Resolution {
                            state,
                            property,
                            asset,
                        });
                    }
                }
            }
        }
        let mut s = style.borrow_mut();
        for r in resolved {
            s.state_mut(r.state).resolve_asset(r.property, r.asset);
        }
    }

    fn load(&self, style: &StyleRef, kind: AssetKind, path: &str) -> Option<AssetId> {
        let Some((bundle_name, asset)) = path.split_once('|') else {
            let loaded = match kind {
                AssetKind::Texture => self.loader.load_texture(path),
                AssetKind::Font => self.loader.load_font(path),
            };
            if loaded.is_none() {
                warn!(path, "resource not found");
            }
            return loaded;
        };
        let bundle = self.bundles.borrow().get(bundle_name).cloned();
        let Some(bundle) = bundle else {
            self.park(bundle_name, style);
            return None;
        };
        let loaded = match kind {
            AssetKind::Texture => bundle.load_texture(asset),
            AssetKind::Font => bundle.load_font(asset),
        };
        if loaded.is_none() {
            warn!(bundle = bundle_name, asset, "asset not found in bundle");
        }
        loaded
    }

    fn park(&self, bundle: &str, style: &StyleRef) {
        let mut waiting = self.waiting.borrow_mut();
        let list = waiting.entry(bundle.to_owned()).or_default();
        list.retain(|w| w.strong_count() > 0);
        let weak = Rc::downgrade(style);
        if !list.iter().any(|w| Weak::ptr_eq(w, &weak)) {
            debug!(bundle, "style waits for bundle");
            list.push(weak);
        }
    }

    /// Start tracking a bundle download.
    ///
    /// If the bundle is already registered, `on_complete` runs immediately. A
    /// second download under a name that is still loading is ignored with a warning.
    pub fn load_bundle(
        &self,
        name: &str,
        download: impl BundleDownload + 'static,
        on_complete: Option<LoadCompleted>,
    ) {
        if self.is_loading(name) {
            warn!(bundle = name, "bundle is already loading");
            return;
        }
        if self.contains(name) {
            if let Some(callback) = on_complete {
                callback(name);
            }
            return;
        }
        self.downloads.lock().in_flight.push(InFlight {
            name: name.to_owned(),
            download: Box::new(download),
            on_complete,
        });
    }

    /// Whether a download for `name` is in flight.
    pub fn is_loading(&self, name: &str) -> bool {
        self.downloads.lock().in_flight.iter().any(|d| d.name == name)
    }

    /// Check in-flight downloads, registering finished bundles and running their
    /// completion callbacks.
    pub fn poll(&self) {
        let finished = {
            let mut downloads = self.downloads.lock();
            let (done, running): (Vec<_>, Vec<_>) = core::mem::take(&mut downloads.in_flight)
                .into_iter()
                .partition(|d| d.download.is_done());
            downloads.in_flight = running;
            downloads.finished += done.len();
            self.accumulated
                .set(downloads.in_flight.iter().map(|d| d.download.progress()).sum());
            if downloads.in_flight.is_empty() {
                downloads.finished = 0;
                self.accumulated.set(0.0);
            }
            done
        };
        for mut item in finished {
            match item.download.take_bundle() {
                Some(bundle) => {
                    self.register(&item.name, bundle);
                }
                None => error!(bundle = %item.name, "download does not contain an asset bundle"),
            }
            if let Some(callback) = item.on_complete.take() {
                callback(&item.name);
            }
        }
    }

    /// Aggregate progress of the current batch of downloads, `1.0` when idle.
    pub fn progress(&self) -> f32 {
        let downloads = self.downloads.lock();
        let total = downloads.in_flight.len() + downloads.finished;
        if total == 0 {
            return 1.0;
        }
        (downloads.finished as f32 + self.accumulated.get()) / total as f32
    }
}

//! Reactive map state.
//!
//! `MapStore` is the single source of truth for everything the user can
//! change: view, layer toggles, height filter, colour mode, selection, hover.
//! It is an explicit value owned by the application and passed by reference
//! to the resolver, camera and layer composition.
//!
//! Update contract:
//! - Every setter replaces one slice wholesale.
//! - Subscribers registered for that slice run synchronously, in registration
//!   order, before the setter returns.
//! - Writing a value equal to the current one is a no-op (no revision bump,
//!   no notification).

use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use runtime::{EventBus, Frame};
use tracing::{trace, warn};

use crate::feature::{BuildingProperties, Feature, PoiProperties};
use crate::picking::PickInfo;
use crate::selection::Selection;
use crate::view::{INITIAL_VIEW_STATE, ViewState, ViewStatePatch};
use crate::visibility::{ColourMode, HeightRange, LayerToggle, LayerToggles};

/// Independently observable parts of [`MapState`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Slice {
    ViewState,
    Toggles,
    HeightRange,
    ColourMode,
    Selection,
    Hover,
    PerfOverlay,
}

impl Slice {
    pub const ALL: [Slice; 7] = [
        Slice::ViewState,
        Slice::Toggles,
        Slice::HeightRange,
        Slice::ColourMode,
        Slice::Selection,
        Slice::Hover,
        Slice::PerfOverlay,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Slice::ViewState => "view_state",
            Slice::Toggles => "toggles",
            Slice::HeightRange => "height_range",
            Slice::ColourMode => "colour_mode",
            Slice::Selection => "selection",
            Slice::Hover => "hover",
            Slice::PerfOverlay => "perf_overlay",
        }
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of slices a subscriber depends on.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct SliceMask(u8);

impl SliceMask {
    pub const NONE: SliceMask = SliceMask(0);
    pub const ALL: SliceMask = SliceMask((1 << Slice::ALL.len()) - 1);

    /// Inputs of layer composition.
    pub const LAYERS: SliceMask = SliceMask(
        (1 << Slice::Toggles as u8) | (1 << Slice::HeightRange as u8) | (1 << Slice::ColourMode as u8),
    );

    pub fn of(slices: &[Slice]) -> Self {
        slices.iter().fold(Self::NONE, |m, s| m | *s)
    }

    pub fn contains(self, slice: Slice) -> bool {
        self.0 & (1 << slice.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<Slice> for SliceMask {
    fn from(slice: Slice) -> Self {
        SliceMask(1 << slice.index())
    }
}

impl BitOr for SliceMask {
    type Output = SliceMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        SliceMask(self.0 | rhs.0)
    }
}

impl BitOr<Slice> for SliceMask {
    type Output = SliceMask;

    fn bitor(self, rhs: Slice) -> Self::Output {
        self | SliceMask::from(rhs)
    }
}

impl BitOr for Slice {
    type Output = SliceMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        SliceMask::from(self) | rhs
    }
}

/// Snapshot of every slice.
#[derive(Debug, Clone, PartialEq)]
pub struct MapState {
    pub view_state: ViewState,
    pub toggles: LayerToggles,
    pub height_range: HeightRange,
    pub colour_mode: ColourMode,
    pub selection: Selection,
    pub hover: Option<PickInfo>,
    pub show_perf_overlay: bool,
}

impl Default for MapState {
    fn default() -> Self {
        Self {
            view_state: INITIAL_VIEW_STATE,
            toggles: LayerToggles::default(),
            height_range: HeightRange::FULL,
            colour_mode: ColourMode::Height,
            selection: Selection::None,
            hover: None,
            show_perf_overlay: false,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&MapState, Slice)>;

struct Subscriber {
    id: SubscriptionId,
    mask: SliceMask,
    callback: Callback,
}

pub struct MapStore {
    state: MapState,
    revisions: [u64; Slice::ALL.len()],
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
    frame: Frame,
    events: EventBus<Slice>,
}

impl fmt::Debug for MapStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapStore")
            .field("state", &self.state)
            .field("revisions", &self.revisions)
            .field("subscribers", &self.subscribers.len())
            .field("frame", &self.frame)
            .finish()
    }
}

impl Default for MapStore {
    fn default() -> Self {
        Self::with_state(MapState::default())
    }
}

impl MapStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut state: MapState) -> Self {
        state.view_state = state.view_state.clamped();
        Self {
            state,
            revisions: [0; Slice::ALL.len()],
            subscribers: Vec::new(),
            next_subscription: 0,
            frame: Frame::default(),
            events: EventBus::new(),
        }
    }

    pub fn with_initial_view(view_state: ViewState) -> Self {
        Self::with_state(MapState {
            view_state,
            ..MapState::default()
        })
    }

    // ---- reads ----------------------------------------------------------

    pub fn state(&self) -> &MapState {
        &self.state
    }

    pub fn view_state(&self) -> ViewState {
        self.state.view_state
    }

    pub fn toggles(&self) -> LayerToggles {
        self.state.toggles
    }

    pub fn height_range(&self) -> HeightRange {
        self.state.height_range
    }

    pub fn colour_mode(&self) -> ColourMode {
        self.state.colour_mode
    }

    pub fn selection(&self) -> &Selection {
        &self.state.selection
    }

    pub fn hover(&self) -> Option<&PickInfo> {
        self.state.hover.as_ref()
    }

    pub fn show_perf_overlay(&self) -> bool {
        self.state.show_perf_overlay
    }

    /// Number of committed writes to `slice`.
    pub fn revision(&self, slice: Slice) -> u64 {
        self.revisions[slice.index()]
    }

    // ---- frames and change log -----------------------------------------

    /// Tags subsequent change events with `frame`.
    pub fn begin_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn events(&self) -> &EventBus<Slice> {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<runtime::Event<Slice>> {
        self.events.drain()
    }

    // ---- subscriptions -------------------------------------------------

    pub fn subscribe(
        &mut self,
        mask: impl Into<SliceMask>,
        callback: impl FnMut(&MapState, Slice) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push(Subscriber {
            id,
            mask: mask.into(),
            callback: Box::new(callback),
        });
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    // ---- writes --------------------------------------------------------

    /// Replaces the view. Non-finite input is rejected; everything else is
    /// clamped to the view invariants.
    pub fn set_view_state(&mut self, view_state: ViewState) -> bool {
        if !view_state.is_finite() {
            warn!(?view_state, "rejected non-finite view state");
            return false;
        }
        let next = view_state.clamped();
        if self.state.view_state == next {
            return false;
        }
        self.state.view_state = next;
        self.commit(Slice::ViewState, || {
            format!(
                "lon={:.5} lat={:.5} zoom={:.2} pitch={:.1} bearing={:.1}",
                next.longitude, next.latitude, next.zoom, next.pitch, next.bearing
            )
        });
        true
    }

    pub fn patch_view_state(&mut self, patch: ViewStatePatch) -> bool {
        self.set_view_state(self.state.view_state.apply(patch))
    }

    pub fn set_toggles(&mut self, toggles: LayerToggles) -> bool {
        if self.state.toggles == toggles {
            return false;
        }
        self.state.toggles = toggles;
        self.commit(Slice::Toggles, || format!("{toggles:?}"));
        true
    }

    pub fn set_toggle(&mut self, toggle: LayerToggle, on: bool) -> bool {
        self.set_toggles(self.state.toggles.with(toggle, on))
    }

    /// Flips one switch; returns the new value.
    pub fn toggle(&mut self, toggle: LayerToggle) -> bool {
        let on = !self.state.toggles.get(toggle);
        self.set_toggle(toggle, on);
        on
    }

    pub fn set_height_range(&mut self, range: HeightRange) -> bool {
        if self.state.height_range == range {
            return false;
        }
        self.state.height_range = range;
        self.commit(Slice::HeightRange, || range.to_string());
        true
    }

    pub fn reset_height_range(&mut self) -> bool {
        self.set_height_range(HeightRange::FULL)
    }

    pub fn set_colour_mode(&mut self, mode: ColourMode) -> bool {
        if self.state.colour_mode == mode {
            return false;
        }
        self.state.colour_mode = mode;
        self.commit(Slice::ColourMode, || mode.to_string());
        true
    }

    pub fn set_selection(&mut self, selection: Selection) -> bool {
        if self.state.selection == selection {
            return false;
        }
        let kind = selection.kind();
        self.state.selection = selection;
        self.commit(Slice::Selection, || kind.to_string());
        true
    }

    /// Selects a building; any POI selection is dropped.
    pub fn select_building(&mut self, building: Arc<Feature<BuildingProperties>>) -> bool {
        self.set_selection(Selection::Building(building))
    }

    /// Selects a POI; any building selection is dropped.
    pub fn select_poi(&mut self, poi: Arc<Feature<PoiProperties>>) -> bool {
        self.set_selection(Selection::Poi(poi))
    }

    pub fn clear_selection(&mut self) -> bool {
        self.set_selection(Selection::None)
    }

    pub fn set_hover(&mut self, hover: Option<PickInfo>) -> bool {
        if self.state.hover == hover {
            return false;
        }
        let present = hover.is_some();
        self.state.hover = hover;
        self.commit(Slice::Hover, || {
            let message = if present { "set" } else { "cleared" };
            message.to_string()
        });
        true
    }

    pub fn set_perf_overlay(&mut self, on: bool) -> bool {
        if self.state.show_perf_overlay == on {
            return false;
        }
        self.state.show_perf_overlay = on;
        self.commit(Slice::PerfOverlay, || on.to_string());
        true
    }

    pub fn toggle_perf_overlay(&mut self) -> bool {
        let on = !self.state.show_perf_overlay;
        self.set_perf_overlay(on);
        on
    }

    fn commit(&mut self, slice: Slice, describe: impl FnOnce() -> String) {
        self.revisions[slice.index()] += 1;
        let message = describe();
        trace!(slice = slice.as_str(), revision = self.revisions[slice.index()], %message, "store update");
        self.events.emit(self.frame, slice, message);

        let state = &self.state;
        for sub in self.subscribers.iter_mut().filter(|s| s.mask.contains(slice)) {
            (sub.callback)(state, slice);
        }
    }
}

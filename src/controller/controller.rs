//! Animation editor controller.
//!
//! One controller edits the animation of one component. Every command reloads
//! what it needs from the component's attributes, applies its change inside an
//! undo scope, and pushes the resulting display state to its sink.

use tracing::{debug, info, info_span, warn};

use super::events::{EventHandler, HostEvent};
use super::presentation::PresentationSink;
use crate::anim::{
    AnimationChannel, CoordinateAdapter, HideShowMode, HideShowRule, HideShowStore, KeyframeStore,
};
use crate::core::keys::{frame_key, hs_key, KEY_DATAREF, KEY_INDEX, KEY_LOOP};
use crate::core::{AttrValue, AttributeStore, EditScope, EntityId, Host, HostContext, HsField, VarKey};
use crate::settings::Settings;
use crate::util::{format_number, DMat4, Error, Result};

/// Lifecycle of a controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ControllerState {
    /// Created but not attached to its component yet.
    #[default]
    Uninitialized,
    /// Attached; editability not evaluated yet.
    Bound,
    /// Component is reachable from the open editing context.
    Editable,
    /// Component is outside the open editing context; commands are ignored.
    Locked,
    /// Terminal.
    Closed,
}

impl ControllerState {
    #[inline]
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }

    #[inline]
    pub fn is_editable(self) -> bool {
        matches!(self, Self::Editable)
    }
}

/// Controller binding one component's animation to a presentation sink.
pub struct AnimationController<P: PresentationSink> {
    id: EntityId,
    state: ControllerState,
    settings: Settings,
    sink: P,
    /// Merge key of the last committed scope, cleared by external changes.
    last_merge_key: Option<String>,
}

fn attrs<H: HostContext + ?Sized>(host: &H, id: EntityId) -> Result<&H::Attrs> {
    host.attributes(id).ok_or(Error::StaleReference(id))
}

fn attrs_mut<H: HostContext + ?Sized>(host: &mut H, id: EntityId) -> Result<&mut H::Attrs> {
    host.attributes_mut(id).ok_or(Error::StaleReference(id))
}

fn live_transform<H: HostContext + ?Sized>(host: &H, id: EntityId) -> Result<DMat4> {
    host.local_transform(id).ok_or(Error::StaleReference(id))
}

fn check_target<H: HostContext + ?Sized>(host: &H, id: EntityId) -> Result<()> {
    match host.kind(id) {
        None => Err(Error::StaleReference(id)),
        Some(kind) if !kind.is_component_like() => Err(Error::InvalidTarget(id)),
        Some(_) => Ok(()),
    }
}

fn previewable<S: AttributeStore + ?Sized>(attrs: &S, dict: &str) -> bool {
    match AnimationChannel::load(attrs, dict) {
        Ok(channel) => channel.is_some_and(|c| c.can_preview()),
        Err(e) => {
            debug!(error = %e, "animation data unreadable, preview disabled");
            false
        }
    }
}

impl<P: PresentationSink> AnimationController<P> {
    /// Create a controller for `id` without touching the host.
    pub fn new(id: EntityId, sink: P, settings: Settings) -> Self {
        Self {
            id,
            state: ControllerState::Uninitialized,
            settings,
            sink,
            last_merge_key: None,
        }
    }

    /// Create and attach a controller for an animated component.
    pub fn open<H: Host>(host: &mut H, id: EntityId, sink: P, settings: Settings) -> Result<Self> {
        let mut controller = Self::new(id, sink, settings);
        controller.attach(host)?;
        Ok(controller)
    }

    /// Start a new animation on `id` and open a controller for it.
    pub fn create<H: Host>(host: &mut H, id: EntityId, sink: P, settings: Settings) -> Result<Self> {
        check_target(&*host, id)?;
        let live = live_transform(&*host, id)?;
        let stored = CoordinateAdapter::to_stored(&live, CoordinateAdapter::correction(&*host, id).as_ref());

        let scope = EditScope::single("Animate");
        host.start(&scope);
        let created = attrs_mut(host, id)
            .and_then(|attrs| AnimationChannel::create(attrs, &settings.dictionary, stored));
        match created {
            Ok(_) => host.commit(&scope),
            Err(e) => {
                host.abort(&scope);
                return Err(e);
            }
        }
        info!(id = %id, "animation created");
        Self::open(host, id, sink, settings)
    }

    /// Bind to the component and show its animation.
    pub fn attach<H: Host>(&mut self, host: &mut H) -> Result<()> {
        if self.state != ControllerState::Uninitialized {
            return Err(Error::precondition("controller is already attached"));
        }
        check_target(&*host, self.id)?;
        self.state = ControllerState::Bound;
        debug!(id = %self.id, "controller bound");
        self.refresh(&*host)
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut P {
        &mut self.sink
    }

    /// Close the controller. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.state.is_closed() {
            return;
        }
        self.state = ControllerState::Closed;
        self.last_merge_key = None;
        self.sink.closed();
        debug!(id = %self.id, "controller closed");
    }

    /// Rebuild the whole display from the component's attributes.
    pub fn refresh<H: HostContext>(&mut self, host: &H) -> Result<()> {
        let _span = info_span!("refresh", id = %self.id).entered();
        if matches!(self.state, ControllerState::Uninitialized | ControllerState::Closed) {
            return Ok(());
        }
        if !self.check_alive(host) {
            return Ok(());
        }
        let dict = self.settings.dictionary.clone();
        let attrs = attrs(&*host, self.id)?;
        if !AnimationChannel::exists(attrs, &dict) {
            info!(id = %self.id, "animation removed, closing editor");
            self.close();
            return Ok(());
        }

        let editable = CoordinateAdapter::is_editable(host, self.id);
        self.set_editable(editable);

        let text = |key: &str| attrs.get_text(&dict, key).unwrap_or_default();
        let title = format!("{}{}", self.settings.title_prefix, host.name(self.id));
        self.sink.reset(&title, &text(KEY_DATAREF), &text(KEY_INDEX));

        let frames = KeyframeStore::count(attrs, &dict);
        for i in 0..frames {
            self.sink.add_keyframe_row(i, &text(&frame_key(i)), frames > 2);
        }
        self.sink.add_loop(&text(KEY_LOOP));

        let rules = HideShowStore::count(attrs, &dict);
        for i in 0..rules {
            self.sink.add_hide_show_row(
                i,
                &text(&hs_key(i, HsField::Mode)),
                &text(&hs_key(i, HsField::Dataref)),
                &text(&hs_key(i, HsField::Index)),
                &text(&hs_key(i, HsField::From)),
                &text(&hs_key(i, HsField::To)),
            );
        }

        self.sink.set_enabled(editable, previewable(attrs, &dict));
        Ok(())
    }

    /// Set one field of the animation from the editing surface.
    ///
    /// `key` uses the command vocabulary of [`VarKey`]. An empty loop value
    /// turns looping off.
    pub fn set_var<H: Host>(&mut self, host: &mut H, key: &str, value: &str) -> Result<()> {
        if !self.ready(&*host, "set_var")? {
            return Ok(());
        }
        let key: VarKey = key.parse()?;
        let value = value.trim();
        let dict = self.settings.dictionary.clone();
        let id = self.id;

        {
            let attrs = attrs(&*host, id)?;
            match key {
                VarKey::Frame(i) => {
                    let n = KeyframeStore::count(attrs, &dict);
                    if i >= n {
                        return Err(Error::not_found("keyframe", i, n));
                    }
                }
                VarKey::HideShow(i, _) => {
                    let n = HideShowStore::count(attrs, &dict);
                    if i >= n {
                        return Err(Error::not_found("hide/show rule", i, n));
                    }
                }
                _ => {}
            }
        }
        let clears_loop = key == VarKey::Loop && value.is_empty();
        if key.is_numeric() && !clears_loop && !value.parse::<f64>().is_ok_and(f64::is_finite) {
            return Err(Error::invalid_value(key.to_string(), value));
        }
        if matches!(key, VarKey::HideShow(_, HsField::Mode)) && value.parse::<HideShowMode>().is_err() {
            return Err(Error::invalid_value(key.to_string(), value));
        }

        let scope = EditScope::mergeable("Set Value", format!("set_var:{}", key));
        self.scoped(host, scope, |host| {
            let attrs = attrs_mut(host, id)?;
            if clears_loop {
                attrs.delete(&dict, KEY_LOOP);
            } else {
                attrs.set(&dict, &key.store_key(), AttrValue::Str(value.to_string()));
            }
            Ok(())
        })?;
        debug!(%key, value, "value set");
        self.update_enabled(&*host);
        Ok(())
    }

    /// Capture the component's current transform into keyframe `index`.
    pub fn set_transform<H: Host>(&mut self, host: &mut H, index: usize) -> Result<()> {
        if !self.ready(&*host, "set_transform")? {
            return Ok(());
        }
        let dict = self.settings.dictionary.clone();
        let id = self.id;
        let stored = self.stored_transform(&*host)?;

        let scope = EditScope::mergeable("Set Keyframe Position", format!("set_transform:{}", index));
        self.scoped(host, scope, |host| {
            let attrs = attrs_mut(host, id)?;
            let mut frames = KeyframeStore::load(&*attrs, &dict)?;
            frames.set_transform(index, stored)?;
            frames.flush(attrs, &dict);
            Ok(())
        })?;
        debug!(index, "keyframe transform captured");
        Ok(())
    }

    /// Move the component to the pose stored in keyframe `index`.
    ///
    /// The component keeps its current scale.
    pub fn get_transform<H: Host>(&mut self, host: &mut H, index: usize) -> Result<()> {
        if !self.ready(&*host, "get_transform")? {
            return Ok(());
        }
        let id = self.id;
        let frame = *KeyframeStore::load(attrs(&*host, id)?, &self.settings.dictionary)?.get(index)?;
        let live = self.live_from_stored(&*host, &frame.transform)?;

        let scope = EditScope::mergeable("Show Keyframe", format!("get_transform:{}", index));
        self.scoped(host, scope, |host| host.set_local_transform(id, live))?;
        self.sink
            .set_preview_value(&format_number(frame.value, self.settings.preview_precision));
        Ok(())
    }

    /// Insert a keyframe at `index` holding the component's current pose.
    pub fn insert_frame<H: Host>(&mut self, host: &mut H, index: usize) -> Result<()> {
        if !self.ready(&*host, "insert_frame")? {
            return Ok(());
        }
        let dict = self.settings.dictionary.clone();
        let id = self.id;
        let stored = self.stored_transform(&*host)?;

        self.scoped(host, EditScope::single("Add Keyframe"), |host| {
            let attrs = attrs_mut(host, id)?;
            let mut frames = KeyframeStore::load(&*attrs, &dict)?;
            frames.insert_at(index, stored)?;
            frames.flush(attrs, &dict);
            Ok(())
        })?;
        info!(index, "keyframe inserted");
        self.refresh(&*host)
    }

    /// Delete keyframe `index`. Refused while only two keyframes remain.
    pub fn delete_frame<H: Host>(&mut self, host: &mut H, index: usize) -> Result<()> {
        if !self.ready(&*host, "delete_frame")? {
            return Ok(());
        }
        let dict = self.settings.dictionary.clone();
        let id = self.id;
        let count = KeyframeStore::count(attrs(&*host, id)?, &dict);
        if count <= 2 {
            return Err(Error::precondition(format!(
                "cannot delete keyframe {}: an animation needs at least 2 keyframes",
                index
            )));
        }

        self.scoped(host, EditScope::single("Delete Keyframe"), |host| {
            let attrs = attrs_mut(host, id)?;
            let mut frames = KeyframeStore::load(&*attrs, &dict)?;
            frames.delete_at(index)?;
            frames.flush(attrs, &dict);
            Ok(())
        })?;
        info!(index, "keyframe deleted");
        self.refresh(&*host)
    }

    /// Insert a hide/show rule at `index`, driven by the animation's dataref.
    pub fn insert_hide_show<H: Host>(&mut self, host: &mut H, index: usize) -> Result<()> {
        if !self.ready(&*host, "insert_hide_show")? {
            return Ok(());
        }
        let dict = self.settings.dictionary.clone();
        let id = self.id;

        self.scoped(host, EditScope::single("Add Hide/Show"), |host| {
            let attrs = attrs_mut(host, id)?;
            let mut rules = HideShowStore::load(&*attrs, &dict)?;
            let rule = HideShowRule::new(
                rules.default_mode(),
                attrs.get_text(&dict, KEY_DATAREF).unwrap_or_default(),
                attrs.get_text(&dict, KEY_INDEX).unwrap_or_default(),
            );
            rules.insert_at(index, rule)?;
            rules.flush(attrs, &dict);
            Ok(())
        })?;
        info!(index, "hide/show rule inserted");
        self.refresh(&*host)
    }

    /// Delete hide/show rule `index`.
    pub fn delete_hide_show<H: Host>(&mut self, host: &mut H, index: usize) -> Result<()> {
        if !self.ready(&*host, "delete_hide_show")? {
            return Ok(());
        }
        let dict = self.settings.dictionary.clone();
        let id = self.id;

        self.scoped(host, EditScope::single("Delete Hide/Show"), |host| {
            let attrs = attrs_mut(host, id)?;
            let mut rules = HideShowStore::load(&*attrs, &dict)?;
            rules.delete_at(index)?;
            rules.flush(attrs, &dict);
            Ok(())
        })?;
        info!(index, "hide/show rule deleted");
        self.refresh(&*host)
    }

    /// Remove the whole animation from the component and close.
    pub fn erase<H: Host>(&mut self, host: &mut H) -> Result<()> {
        if !self.ready(&*host, "erase")? {
            return Ok(());
        }
        let dict = self.settings.dictionary.clone();
        let id = self.id;

        self.scoped(host, EditScope::single("Erase Animation"), |host| {
            AnimationChannel::erase(attrs_mut(host, id)?, &dict);
            Ok(())
        })?;
        info!(id = %id, "animation erased");
        self.close();
        Ok(())
    }

    /// Pose the component at `progress` (0..1) through the animation range.
    pub fn preview<H: Host>(&mut self, host: &mut H, progress: f64) -> Result<()> {
        if !self.ready(&*host, "preview")? {
            return Ok(());
        }
        let _span = info_span!("preview", id = %self.id, progress).entered();
        let id = self.id;
        let Some(channel) = AnimationChannel::load(attrs(&*host, id)?, &self.settings.dictionary)? else {
            self.close();
            return Ok(());
        };
        if !channel.can_preview() {
            return Err(Error::precondition("animation cannot be previewed"));
        }
        let evaluation = channel.evaluate(progress)?;
        let live = self.live_from_stored(&*host, &evaluation.transform)?;

        self.scoped(host, EditScope::mergeable("Preview Animation", "preview"), |host| {
            host.set_local_transform(id, live)
        })?;
        self.sink
            .set_preview_value(&format_number(evaluation.value, self.settings.preview_precision));
        self.sink.set_preview_visible(evaluation.visibility.is_visible());
        Ok(())
    }

    /// Current live transform of the component, converted to stored form.
    fn stored_transform<H: HostContext>(&self, host: &H) -> Result<DMat4> {
        let live = live_transform(&*host, self.id)?;
        let correction = CoordinateAdapter::correction(&*host, self.id);
        Ok(CoordinateAdapter::to_stored(&live, correction.as_ref()))
    }

    /// Live transform for a stored pose, keeping the component's current scale.
    fn live_from_stored<H: HostContext>(&self, host: &H, stored: &DMat4) -> Result<DMat4> {
        let live = live_transform(&*host, self.id)?;
        let correction = CoordinateAdapter::correction(&*host, self.id);
        Ok(CoordinateAdapter::from_stored(
            stored,
            correction.as_ref(),
            CoordinateAdapter::live_scale(&live),
        ))
    }

    /// Close if the component is gone. Returns whether it is still there.
    fn check_alive<H: HostContext>(&mut self, host: &H) -> bool {
        if host.kind(self.id).is_some() {
            return true;
        }
        warn!(id = %self.id, "component no longer exists, closing editor");
        self.close();
        false
    }

    /// Whether a command may run now.
    ///
    /// Closes when the component or its animation marker is gone.
    fn ready<H: HostContext>(&mut self, host: &H, command: &str) -> Result<bool> {
        match self.state {
            ControllerState::Uninitialized => {
                return Err(Error::precondition("controller is not attached"));
            }
            ControllerState::Closed => return Ok(false),
            _ => {}
        }
        if !self.check_alive(host) {
            return Ok(false);
        }
        if !AnimationChannel::exists(attrs(host, self.id)?, &self.settings.dictionary) {
            info!(id = %self.id, command, "animation removed, closing editor");
            self.close();
            return Ok(false);
        }
        if !self.state.is_editable() {
            debug!(id = %self.id, command, "component locked, command ignored");
            return Ok(false);
        }
        Ok(true)
    }

    fn set_editable(&mut self, editable: bool) {
        let state = if editable {
            ControllerState::Editable
        } else {
            ControllerState::Locked
        };
        if state != self.state {
            debug!(id = %self.id, from = ?self.state, to = ?state, "controller state changed");
            self.state = state;
        }
    }

    /// Push enablement after a value edit.
    fn update_enabled<H: HostContext>(&mut self, host: &H) {
        let previewable = attrs(&*host, self.id)
            .map(|a| previewable(a, &self.settings.dictionary))
            .unwrap_or(false);
        self.sink.set_enabled(self.state.is_editable(), previewable);
    }

    /// Run `op` inside an undo scope, merging with the previous scope when
    /// the merge keys match.
    fn scoped<H: Host, T>(
        &mut self,
        host: &mut H,
        scope: EditScope,
        op: impl FnOnce(&mut H) -> Result<T>,
    ) -> Result<T> {
        let merge = self.settings.merge_scopes
            && scope.merge_key.is_some()
            && scope.merge_key == self.last_merge_key;
        if merge {
            host.resume(&scope);
        } else {
            host.start(&scope);
        }
        match op(host) {
            Ok(v) => {
                host.commit(&scope);
                self.last_merge_key = scope.merge_key;
                Ok(v)
            }
            Err(e) => {
                host.abort(&scope);
                self.last_merge_key = None;
                warn!(op = scope.op_name, error = %e, "edit aborted");
                Err(e)
            }
        }
    }
}

impl<P: PresentationSink> EventHandler for AnimationController<P> {
    fn handle<H: Host>(&mut self, host: &mut H, event: HostEvent) -> Result<()> {
        if self.state.is_closed() || !event.concerns(self.id) {
            return Ok(());
        }
        debug!(id = %self.id, ?event, "host event");
        if event.is_external_change() {
            self.last_merge_key = None;
        }
        match event {
            HostEvent::Erased(_) => {
                self.close();
                Ok(())
            }
            HostEvent::AttributeChanged { external: false, .. } => Ok(()),
            HostEvent::Undo
            | HostEvent::Redo
            | HostEvent::FocusChanged
            | HostEvent::AttributeChanged { external: true, .. } => self.refresh(&*host),
        }
    }
}

use crate::registry::Registry;
use crate::wire::bytes::{PropRef, Reader};
use crate::wire::etype;
use proptree::event::{ActionMap, TrackKind, UserEvent};
use proptree::logging;
use proptree::prop::Prop;
use proptree::sub::PropTree;

/// Decodes typed user-event payloads out of EVENT frames. Proprefs inside
/// a payload resolve against the session's id registry, so the decoder
/// borrows the session's view of the world for the duration of one frame.
pub struct EventDecoder<'a> {
    pub registry: &'a Registry,
    pub tree: &'a dyn PropTree,
    pub actions: &'a dyn ActionMap,
    pub log: &'a logging::Logger,
}

impl<'a> EventDecoder<'a> {
    /// Decode one event payload. `None` means the event is dropped; the
    /// frame itself was well-formed, so the session stays up.
    pub fn decode(&self, event: u8, payload: &[u8]) -> Option<UserEvent> {
        let mut r = Reader::new(payload);

        match event {
            etype::ACTION_VECTOR => self.action_vector(&mut r),
            etype::OPENURL => self.open_url(&mut r),
            etype::PLAYTRACK => self.play_track(&mut r),
            etype::DYNAMIC_ACTION => Some(UserEvent::DynamicAction(r.cstr())),
            etype::SELECT_AUDIO_TRACK => self.select_track(&mut r, TrackKind::Audio),
            etype::SELECT_SUBTITLE_TRACK => self.select_track(&mut r, TrackKind::Subtitle),
            other => {
                logging::error!(self.log, "Can't handle event type";
                                "context" => "event", "event_type" => other);
                None
            }
        }
    }

    fn action_vector(&self, r: &mut Reader) -> Option<UserEvent> {
        let names = r.string_vector().ok()?;
        let mut actions = Vec::with_capacity(names.len());
        for name in &names {
            match self.actions.action_by_name(name) {
                Some(action) => actions.push(action),
                None => {
                    logging::warn!(self.log, "unknown action";
                                   "context" => "event", "action" => name.as_str());
                }
            }
        }
        Some(UserEvent::Actions(actions))
    }

    /// Feature-flagged fields decode in a fixed order; any failure clears
    /// the flags so the partially decoded event is dropped as a whole.
    fn open_url(&self, r: &mut Reader) -> Option<UserEvent> {
        let mut flags = r.u8().ok()?;

        let mut url = None;
        let mut view = None;
        let mut item_model = None;
        let mut parent_model = None;
        let mut how = None;
        let mut parent_url = None;

        if flags & 0x01 != 0 {
            match r.string() {
                Ok(s) => url = Some(s),
                Err(_) => flags = 0,
            }
        }
        if flags & 0x02 != 0 {
            match r.string() {
                Ok(s) => view = Some(s),
                Err(_) => flags = 0,
            }
        }
        if flags & 0x04 != 0 {
            match self.propref(r) {
                Some(p) => item_model = Some(p),
                None => flags = 0,
            }
        }
        if flags & 0x08 != 0 {
            match self.propref(r) {
                Some(p) => parent_model = Some(p),
                None => flags = 0,
            }
        }
        if flags & 0x10 != 0 {
            match r.string() {
                Ok(s) => how = Some(s),
                Err(_) => flags = 0,
            }
        }
        if flags & 0x20 != 0 {
            match r.string() {
                Ok(s) => parent_url = Some(s),
                Err(_) => flags = 0,
            }
        }

        if flags == 0 {
            return None;
        }
        Some(UserEvent::OpenUrl {
            url,
            view,
            item_model,
            parent_model,
            how,
            parent_url,
        })
    }

    fn play_track(&self, r: &mut Reader) -> Option<UserEvent> {
        let flags = r.u8().ok()?;
        let track = self.propref(r)?;
        let source_model = if flags & 0x01 != 0 {
            self.propref(r)
        } else {
            None
        };
        let mode = r.u8().unwrap_or(0);

        Some(UserEvent::PlayTrack {
            track,
            source_model,
            mode,
        })
    }

    fn select_track(&self, r: &mut Reader, kind: TrackKind) -> Option<UserEvent> {
        let flags = r.u8().ok()?;
        let id = r.string().ok()?;
        Some(UserEvent::SelectTrack {
            kind,
            id,
            manual: flags & 0x01 != 0,
        })
    }

    fn propref(&self, r: &mut Reader) -> Option<Prop> {
        let propref = PropRef::read(r).ok()?;
        self.registry.resolve_ref(self.tree, &propref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{prop, Actions, ScriptedTree};
    use crate::wire::bytes::Writer;
    use proptree::event::Action;
    use proptree::logging;

    struct Fixture {
        registry: Registry,
        tree: ScriptedTree,
        actions: Actions,
        log: logging::Logger,
    }

    impl Fixture {
        fn new() -> Fixture {
            Fixture {
                registry: Registry::new(logging::discard()),
                tree: ScriptedTree::new(),
                actions: Actions::new(&[("Up", 1), ("Down", 2)]),
                log: logging::discard(),
            }
        }

        fn decode(&self, event: u8, payload: &[u8]) -> Option<UserEvent> {
            let decoder = EventDecoder {
                registry: &self.registry,
                tree: &self.tree,
                actions: &self.actions,
                log: &self.log,
            };
            decoder.decode(event, payload)
        }
    }

    #[test]
    fn test_action_vector() {
        let fixture = Fixture::new();
        let mut w = Writer::new();
        w.string_vector(&["Up".to_string(), "Bogus".to_string(), "Down".to_string()]);

        match fixture.decode(etype::ACTION_VECTOR, &w.into_inner()) {
            Some(UserEvent::Actions(actions)) => {
                assert_eq!(actions, vec![Action(1), Action(2)]);
            }
            other => panic!("Unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_open_url_full() {
        let mut fixture = Fixture::new();
        let model = prop();
        let model_id = fixture.registry.export(1, model.clone());

        let mut w = Writer::new();
        w.u8(0x01 | 0x04 | 0x10);
        w.string("http://x/y");
        w.u32(model_id);
        w.u8(0); // propref path terminator
        w.string("continuous");

        match fixture.decode(etype::OPENURL, &w.into_inner()) {
            Some(UserEvent::OpenUrl {
                url,
                view,
                item_model,
                how,
                ..
            }) => {
                assert_eq!(url.as_deref(), Some("http://x/y"));
                assert_eq!(view, None);
                assert!(item_model.unwrap().is_same(&model));
                assert_eq!(how.as_deref(), Some("continuous"));
            }
            other => panic!("Unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_open_url_partial_decode_drops_event() {
        let fixture = Fixture::new();
        let mut w = Writer::new();
        w.u8(0x01 | 0x02);
        w.string("http://x/y");
        // The view string is missing entirely.

        assert!(fixture
            .decode(etype::OPENURL, &w.into_inner())
            .is_none());
    }

    #[test]
    fn test_open_url_unresolvable_model_drops_event() {
        let fixture = Fixture::new();
        let mut w = Writer::new();
        w.u8(0x04);
        w.u32(999);
        w.u8(0);

        assert!(fixture
            .decode(etype::OPENURL, &w.into_inner())
            .is_none());
    }

    #[test]
    fn test_play_track_with_model_and_mode() {
        let mut fixture = Fixture::new();
        let track = prop();
        let model = prop();
        let track_id = fixture.registry.export(1, track.clone());
        let model_id = fixture.registry.export(1, model.clone());

        let mut w = Writer::new();
        w.u8(0x01);
        w.u32(track_id);
        w.u8(0);
        w.u32(model_id);
        w.u8(0);
        w.u8(2);

        match fixture.decode(etype::PLAYTRACK, &w.into_inner()) {
            Some(UserEvent::PlayTrack {
                track: t,
                source_model,
                mode,
            }) => {
                assert!(t.is_same(&track));
                assert!(source_model.unwrap().is_same(&model));
                assert_eq!(mode, 2);
            }
            other => panic!("Unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_play_track_defaults() {
        let mut fixture = Fixture::new();
        let track = prop();
        let track_id = fixture.registry.export(1, track.clone());

        let mut w = Writer::new();
        w.u8(0);
        w.u32(track_id);
        w.u8(0);

        match fixture.decode(etype::PLAYTRACK, &w.into_inner()) {
            Some(UserEvent::PlayTrack {
                source_model, mode, ..
            }) => {
                assert!(source_model.is_none());
                assert_eq!(mode, 0);
            }
            other => panic!("Unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_play_track_unresolved_track_dropped() {
        let fixture = Fixture::new();
        let mut w = Writer::new();
        w.u8(0);
        w.u32(42);
        w.u8(0);

        assert!(fixture
            .decode(etype::PLAYTRACK, &w.into_inner())
            .is_none());
    }

    #[test]
    fn test_dynamic_action() {
        let fixture = Fixture::new();
        match fixture.decode(etype::DYNAMIC_ACTION, b"skipNext\0") {
            Some(UserEvent::DynamicAction(name)) => assert_eq!(name, "skipNext"),
            other => panic!("Unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_select_subtitle_track_manual() {
        let fixture = Fixture::new();
        let mut w = Writer::new();
        w.u8(0x01);
        w.string("sub:3");

        match fixture.decode(etype::SELECT_SUBTITLE_TRACK, &w.into_inner()) {
            Some(UserEvent::SelectTrack { kind, id, manual }) => {
                assert_eq!(kind, TrackKind::Subtitle);
                assert_eq!(id, "sub:3");
                assert!(manual);
            }
            other => panic!("Unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_select_audio_track_missing_id_dropped() {
        let fixture = Fixture::new();
        assert!(fixture.decode(etype::SELECT_AUDIO_TRACK, &[0]).is_none());
    }

    #[test]
    fn test_unknown_event_type_dropped() {
        let fixture = Fixture::new();
        assert!(fixture.decode(200, &[1, 2, 3]).is_none());
    }
}

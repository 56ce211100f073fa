//! Конечный автомат жестов с подавлением дребезга.
//!
//! Один вызов на кадр с точками руки. Расстояния щипка сравниваются с порогами,
//! масштабированными по размеру руки; зазор между порогами закрытия и открытия
//! образует гистерезис, который не даёт каналу дребезжать.
//!
//! Каналы, в порядке обработки на каждом кадре:
//!   1. большой + указательный: нажатие/отпускание (перетаскивание);
//!   2. большой + средний: клик или двойной клик внутри окна;
//!   3. большой + безымянный: правый клик;
//!   4. кончик указательного: сглаженное движение курсора.
//! Тапы обрабатываются только пока нет перетаскивания.

use std::time::Duration;

use crate::algorithm::cursor_smoothing::CursorFilter;
use crate::algorithm::geometry::{hand_scale, landmark_distance};
use crate::models::intent::{GestureLabel, Intent, ScreenPoint, ScreenSize};
use crate::models::landmarks::{
    Landmark, LandmarkFrame, INDEX_TIP, MIDDLE_TIP, RING_TIP, THUMB_TIP,
};
use crate::models::settings::{CursorSettings, GestureSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TapState {
    /// Armed: the next close crossing fires.
    #[default]
    Idle,
    /// Fired; waits for the fingers to open past the open threshold.
    Tapped,
}

/// All debounce state, owned by exactly one [`GestureStateMachine`].
///
/// Timestamps are offsets from the sensing loop's start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureState {
    pub drag: DragState,
    pub left_tap: TapState,
    pub right_tap: TapState,
    /// Time of the last single click; `None` once a double click consumed it.
    pub last_left_tap: Option<Duration>,
    pub last_right_click: Option<Duration>,
    /// Start of the current detection dropout.
    pub hand_lost_since: Option<Duration>,
}

/// Intents produced by one frame, in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutcome {
    pub intents: Vec<Intent>,
    pub label: GestureLabel,
}

impl FrameOutcome {
    fn emit(&mut self, intent: Intent, label: GestureLabel) {
        self.intents.push(intent);
        self.label = label;
    }
}

#[derive(Debug, Clone, Copy)]
struct Thresholds {
    close: f64,
    open: f64,
}

pub struct GestureStateMachine {
    settings: GestureSettings,
    screen: ScreenSize,
    mirror_x: bool,
    cursor: CursorFilter,
    state: GestureState,
}

impl GestureStateMachine {
    pub fn new(
        settings: GestureSettings,
        cursor_settings: &CursorSettings,
        screen: ScreenSize,
        cursor_seed: ScreenPoint,
    ) -> Self {
        Self {
            settings,
            screen,
            mirror_x: cursor_settings.mirror_x,
            cursor: CursorFilter::new(cursor_settings.smoothing, cursor_seed),
            state: GestureState::default(),
        }
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Evaluates one detected hand. Updates debounce state exactly once.
    pub fn process(&mut self, frame: &LandmarkFrame, now: Duration) -> FrameOutcome {
        self.state.hand_lost_since = None;

        let scale = hand_scale(frame);
        let thresholds = Thresholds {
            close: self.settings.pinch_close_factor * scale,
            open: self.settings.pinch_open_factor * scale,
        };
        let mut outcome = FrameOutcome::default();

        self.update_drag(frame, thresholds, &mut outcome);
        if self.state.drag == DragState::Idle {
            self.update_left_tap(frame, thresholds, now, &mut outcome);
            self.update_right_tap(frame, thresholds, now, &mut outcome);
        }

        let target = self.to_screen(frame.index_tip());
        outcome.intents.push(Intent::Move(self.cursor.next(target)));

        outcome
    }

    /// Called on frames where no hand was detected.
    ///
    /// State stays frozen so a drag survives a short dropout. Once the dropout
    /// outlasts the release timeout, a pending drag is released exactly once.
    pub fn hand_lost(&mut self, now: Duration) -> FrameOutcome {
        let since = *self.state.hand_lost_since.get_or_insert(now);
        let mut outcome = FrameOutcome::default();

        if self.state.drag == DragState::Dragging
            && now.saturating_sub(since) >= self.settings.drag_release_timeout()
        {
            log::debug!(
                "gesture: hand lost for {:?}, forcing drag release",
                now.saturating_sub(since)
            );
            self.state.drag = DragState::Idle;
            outcome.emit(Intent::ReleaseHold, GestureLabel::SelectionEnd);
        }

        outcome
    }

    /// Releases a drag still held when the landmark stream ends.
    pub fn finish(&mut self) -> Option<Intent> {
        if self.state.drag == DragState::Dragging {
            self.state.drag = DragState::Idle;
            return Some(Intent::ReleaseHold);
        }
        None
    }

    fn update_drag(&mut self, frame: &LandmarkFrame, t: Thresholds, outcome: &mut FrameOutcome) {
        let selection = landmark_distance(frame, THUMB_TIP, INDEX_TIP);
        match self.state.drag {
            DragState::Idle if selection < t.close => {
                self.state.drag = DragState::Dragging;
                outcome.emit(Intent::PressHold, GestureLabel::Selecting);
            }
            DragState::Dragging if selection > t.open => {
                self.state.drag = DragState::Idle;
                outcome.emit(Intent::ReleaseHold, GestureLabel::SelectionEnd);
            }
            _ => {}
        }
    }

    fn update_left_tap(
        &mut self,
        frame: &LandmarkFrame,
        t: Thresholds,
        now: Duration,
        outcome: &mut FrameOutcome,
    ) {
        let distance = landmark_distance(frame, THUMB_TIP, MIDDLE_TIP);
        if distance < t.close && self.state.left_tap == TapState::Idle {
            self.state.left_tap = TapState::Tapped;
            let within_window = self
                .state
                .last_left_tap
                .is_some_and(|last| now.saturating_sub(last) < self.settings.double_tap_window());
            if within_window {
                self.state.last_left_tap = None;
                outcome.emit(Intent::DoubleClick, GestureLabel::DoubleClick);
            } else {
                self.state.last_left_tap = Some(now);
                outcome.emit(Intent::Click, GestureLabel::Click);
            }
        }
        if distance > t.open {
            self.state.left_tap = TapState::Idle;
        }
    }

    fn update_right_tap(
        &mut self,
        frame: &LandmarkFrame,
        t: Thresholds,
        now: Duration,
        outcome: &mut FrameOutcome,
    ) {
        let distance = landmark_distance(frame, THUMB_TIP, RING_TIP);
        if distance < t.close && self.state.right_tap == TapState::Idle {
            // Consumed even when the cooldown swallows the click.
            self.state.right_tap = TapState::Tapped;
            let cooled = self
                .state
                .last_right_click
                .map_or(true, |last| now.saturating_sub(last) >= self.settings.click_cooldown());
            if cooled {
                self.state.last_right_click = Some(now);
                outcome.emit(Intent::RightClick, GestureLabel::RightClick);
            } else {
                log::debug!("gesture: right tap inside click cooldown, ignored");
            }
        }
        if distance > t.open {
            self.state.right_tap = TapState::Idle;
        }
    }

    fn to_screen(&self, landmark: Landmark) -> ScreenPoint {
        let x = if self.mirror_x {
            1.0 - landmark.x
        } else {
            landmark.x
        };
        ScreenPoint {
            x: x * self.screen.width as f64,
            y: landmark.y * self.screen.height as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::landmarks::{LANDMARK_COUNT, MIDDLE_BASE, WRIST};

    const SCALE: f64 = 0.1;
    const OPEN: f64 = 0.3;

    /// Builds a frame with hand scale 0.1 and the given thumb distances.
    fn frame(selection: f64, left: f64, right: f64) -> LandmarkFrame {
        let mut points = vec![Landmark::new(0.5, 0.5); LANDMARK_COUNT];
        points[WRIST] = Landmark::new(0.2, 0.9);
        points[MIDDLE_BASE] = Landmark::new(0.2, 0.9 - SCALE);
        points[THUMB_TIP] = Landmark::new(0.5, 0.5);
        points[INDEX_TIP] = Landmark::new(0.5 + selection, 0.5);
        points[MIDDLE_TIP] = Landmark::new(0.5, 0.5 + left);
        points[RING_TIP] = Landmark::new(0.5 - right, 0.5);
        LandmarkFrame::new(&points).expect("valid frame")
    }

    fn machine() -> GestureStateMachine {
        GestureStateMachine::new(
            GestureSettings::default(),
            &CursorSettings::default(),
            ScreenSize::new(1000, 1000),
            ScreenPoint::new(500.0, 500.0),
        )
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn actions(outcome: &FrameOutcome) -> Vec<Intent> {
        outcome
            .intents
            .iter()
            .copied()
            .filter(|intent| !intent.is_move())
            .collect()
    }

    #[test]
    fn pinch_sequence_presses_releases_and_presses_again() {
        let mut gestures = machine();
        let distances = [0.005, 0.005, 0.20, 0.20, 0.004];
        let produced: Vec<Vec<Intent>> = distances
            .iter()
            .enumerate()
            .map(|(tick, d)| actions(&gestures.process(&frame(*d, OPEN, OPEN), ms(tick as u64 * 33))))
            .collect();

        assert_eq!(produced[0], vec![Intent::PressHold]);
        assert!(produced[1].is_empty());
        assert_eq!(produced[2], vec![Intent::ReleaseHold]);
        assert!(produced[3].is_empty());
        assert_eq!(produced[4], vec![Intent::PressHold]);
    }

    #[test]
    fn dead_band_does_not_chatter() {
        let mut gestures = machine();
        let mut all = Vec::new();
        // close = 0.018, open = 0.035
        for (tick, d) in [0.01, 0.02, 0.03, 0.019, 0.034, 0.025, 0.04, 0.03, 0.02]
            .iter()
            .enumerate()
        {
            all.extend(actions(&gestures.process(&frame(*d, OPEN, OPEN), ms(tick as u64 * 33))));
        }
        assert_eq!(all, vec![Intent::PressHold, Intent::ReleaseHold]);
        assert_eq!(gestures.state().drag, DragState::Idle);
    }

    #[test]
    fn second_tap_inside_window_is_a_double_click() {
        let mut gestures = machine();
        let first = gestures.process(&frame(OPEN, 0.01, OPEN), ms(0));
        assert_eq!(actions(&first), vec![Intent::Click]);
        assert_eq!(first.label, GestureLabel::Click);

        gestures.process(&frame(OPEN, OPEN, OPEN), ms(100));
        let second = gestures.process(&frame(OPEN, 0.01, OPEN), ms(200));
        assert_eq!(actions(&second), vec![Intent::DoubleClick]);
        assert_eq!(second.label, GestureLabel::DoubleClick);
        assert_eq!(gestures.state().last_left_tap, None);
    }

    #[test]
    fn tap_after_double_click_starts_fresh() {
        let mut gestures = machine();
        gestures.process(&frame(OPEN, 0.01, OPEN), ms(0));
        gestures.process(&frame(OPEN, OPEN, OPEN), ms(50));
        gestures.process(&frame(OPEN, 0.01, OPEN), ms(100));
        gestures.process(&frame(OPEN, OPEN, OPEN), ms(150));

        let third = gestures.process(&frame(OPEN, 0.01, OPEN), ms(460));
        assert_eq!(actions(&third), vec![Intent::Click]);
    }

    #[test]
    fn tap_exactly_one_window_after_double_click_is_a_click() {
        let mut gestures = machine();
        gestures.process(&frame(OPEN, 0.01, OPEN), ms(0));
        gestures.process(&frame(OPEN, OPEN, OPEN), ms(50));
        let double = gestures.process(&frame(OPEN, 0.01, OPEN), ms(100));
        assert_eq!(actions(&double), vec![Intent::DoubleClick]);
        gestures.process(&frame(OPEN, OPEN, OPEN), ms(150));

        let third = gestures.process(&frame(OPEN, 0.01, OPEN), ms(450));
        assert_eq!(actions(&third), vec![Intent::Click]);
        assert_eq!(third.label, GestureLabel::Click);
    }

    #[test]
    fn second_tap_exactly_at_window_edge_is_a_click() {
        let mut gestures = machine();
        gestures.process(&frame(OPEN, 0.01, OPEN), ms(0));
        gestures.process(&frame(OPEN, OPEN, OPEN), ms(100));
        let second = gestures.process(&frame(OPEN, 0.01, OPEN), ms(350));
        assert_eq!(actions(&second), vec![Intent::Click]);
    }

    #[test]
    fn taps_outside_window_are_separate_clicks() {
        let mut gestures = machine();
        gestures.process(&frame(OPEN, 0.01, OPEN), ms(0));
        gestures.process(&frame(OPEN, OPEN, OPEN), ms(200));
        let second = gestures.process(&frame(OPEN, 0.01, OPEN), ms(400));
        assert_eq!(actions(&second), vec![Intent::Click]);
    }

    #[test]
    fn held_tap_fires_once() {
        let mut gestures = machine();
        let mut all = Vec::new();
        for tick in 0..10 {
            all.extend(actions(&gestures.process(&frame(OPEN, 0.01, OPEN), ms(tick * 500))));
        }
        assert_eq!(all, vec![Intent::Click]);
        assert_eq!(gestures.state().left_tap, TapState::Tapped);
    }

    #[test]
    fn tap_inside_dead_band_does_not_rearm() {
        let mut gestures = machine();
        gestures.process(&frame(OPEN, 0.01, OPEN), ms(0));
        // 0.025 sits between close and open: still Tapped.
        gestures.process(&frame(OPEN, 0.025, OPEN), ms(500));
        let again = gestures.process(&frame(OPEN, 0.01, OPEN), ms(1000));
        assert!(actions(&again).is_empty());
    }

    #[test]
    fn dragging_suppresses_all_clicks() {
        let mut gestures = machine();
        let first = gestures.process(&frame(0.005, OPEN, OPEN), ms(0));
        assert_eq!(actions(&first), vec![Intent::PressHold]);

        for tick in 1..6 {
            let outcome = gestures.process(&frame(0.01, 0.005, 0.005), ms(tick * 500));
            assert!(actions(&outcome).is_empty());
        }
        assert_eq!(gestures.state().left_tap, TapState::Idle);
        assert_eq!(gestures.state().right_tap, TapState::Idle);
    }

    #[test]
    fn right_tap_is_debounced_and_cooled_down() {
        let mut gestures = machine();
        let first = gestures.process(&frame(OPEN, OPEN, 0.01), ms(0));
        assert_eq!(actions(&first), vec![Intent::RightClick]);
        assert_eq!(first.label, GestureLabel::RightClick);

        gestures.process(&frame(OPEN, OPEN, OPEN), ms(100));
        // Re-armed but inside the 0.4 s cooldown.
        let early = gestures.process(&frame(OPEN, OPEN, 0.01), ms(200));
        assert!(actions(&early).is_empty());
        assert_eq!(gestures.state().right_tap, TapState::Tapped);

        gestures.process(&frame(OPEN, OPEN, OPEN), ms(300));
        let late = gestures.process(&frame(OPEN, OPEN, 0.01), ms(700));
        assert_eq!(actions(&late), vec![Intent::RightClick]);
    }

    #[test]
    fn move_is_emitted_every_frame_last() {
        let mut gestures = machine();
        let outcome = gestures.process(&frame(0.005, OPEN, OPEN), ms(0));
        assert_eq!(outcome.intents.len(), 2);
        assert_eq!(outcome.intents[0], Intent::PressHold);
        assert!(outcome.intents[1].is_move());

        let idle = gestures.process(&frame(0.02, OPEN, OPEN), ms(33));
        assert_eq!(idle.intents.len(), 1);
        assert_eq!(idle.label, GestureLabel::None);
    }

    #[test]
    fn move_targets_index_tip_through_filter() {
        let mut gestures = machine();
        // index tip at (0.5 + 0.3, 0.5) => target (800, 500), seed (500, 500)
        let outcome = gestures.process(&frame(OPEN, OPEN, OPEN), ms(0));
        match outcome.intents.last() {
            Some(Intent::Move(point)) => {
                assert!((point.x - 575.0).abs() < 1e-9);
                assert!((point.y - 500.0).abs() < 1e-9);
            }
            other => panic!("expected move, got {other:?}"),
        }
    }

    #[test]
    fn mirrored_cursor_flips_x() {
        let mut gestures = GestureStateMachine::new(
            GestureSettings::default(),
            &CursorSettings {
                smoothing: 0.5,
                mirror_x: true,
            },
            ScreenSize::new(1000, 800),
            ScreenPoint::default(),
        );
        // target (1000 - 800, 400) = (200, 400), half way from the origin
        let outcome = gestures.process(&frame(OPEN, OPEN, OPEN), ms(0));
        match outcome.intents.last() {
            Some(Intent::Move(point)) => {
                assert!((point.x - 100.0).abs() < 1e-9);
                assert!((point.y - 200.0).abs() < 1e-9);
            }
            other => panic!("expected move, got {other:?}"),
        }
    }

    #[test]
    fn short_dropout_keeps_drag() {
        let mut gestures = machine();
        gestures.process(&frame(0.005, OPEN, OPEN), ms(0));
        assert!(gestures.hand_lost(ms(100)).intents.is_empty());
        assert!(gestures.hand_lost(ms(600)).intents.is_empty());
        assert_eq!(gestures.state().drag, DragState::Dragging);

        // Hand is back: still dragging, no second press.
        let back = gestures.process(&frame(0.005, OPEN, OPEN), ms(700));
        assert!(actions(&back).is_empty());
        assert_eq!(gestures.state().hand_lost_since, None);
    }

    #[test]
    fn long_dropout_forces_single_release() {
        let mut gestures = machine();
        gestures.process(&frame(0.005, OPEN, OPEN), ms(0));
        assert!(gestures.hand_lost(ms(100)).intents.is_empty());

        let released = gestures.hand_lost(ms(1100));
        assert_eq!(released.intents, vec![Intent::ReleaseHold]);
        assert_eq!(released.label, GestureLabel::SelectionEnd);
        assert!(gestures.hand_lost(ms(2000)).intents.is_empty());
        assert_eq!(gestures.state().drag, DragState::Idle);
    }

    #[test]
    fn dropout_freezes_tap_state() {
        let mut gestures = machine();
        gestures.process(&frame(OPEN, 0.01, OPEN), ms(0));
        gestures.hand_lost(ms(50));
        assert_eq!(gestures.state().left_tap, TapState::Tapped);
        assert_eq!(gestures.state().last_left_tap, Some(ms(0)));
    }

    #[test]
    fn finish_releases_pending_drag() {
        let mut gestures = machine();
        assert_eq!(gestures.finish(), None);
        gestures.process(&frame(0.005, OPEN, OPEN), ms(0));
        assert_eq!(gestures.finish(), Some(Intent::ReleaseHold));
        assert_eq!(gestures.finish(), None);
    }
}

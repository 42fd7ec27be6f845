use std::time::Duration;

use log::debug;

/// Why the next frame was scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleReason {
    /// First frame after start-up, rendered regardless of play state
    Startup,
    Animation,
    Interaction,
}

/// Observable phase of the drive loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrivePhase {
    Idle,
    AnimatingScheduled,
    InputDrivenScheduled,
    FrameInFlight,
}

/// Flags and animation clock owned by the drive loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriveState {
    pub is_animating: bool,
    pub is_user_interacting: bool,
    /// Timestamp of the last frame started while animating
    pub last_timestamp: Option<Duration>,
    pub accumulated_animation_time: Duration,
}

/// Decides frame over frame whether another frame should run
///
/// At most one frame is ever scheduled or in flight; repeated events only
/// set flags.
#[derive(Debug, Clone)]
pub struct DriveLoop {
    state: DriveState,
    scheduled: Option<ScheduleReason>,
    in_flight: bool,
}

impl DriveLoop {
    /// Start with one frame scheduled so the first image appears immediately
    pub fn new(start_playing: bool) -> Self {
        Self {
            state: DriveState {
                is_animating: start_playing,
                ..DriveState::default()
            },
            scheduled: Some(ScheduleReason::Startup),
            in_flight: false,
        }
    }

    pub fn state(&self) -> &DriveState {
        &self.state
    }

    pub fn scheduled(&self) -> Option<ScheduleReason> {
        self.scheduled
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn phase(&self) -> DrivePhase {
        if self.in_flight {
            return DrivePhase::FrameInFlight;
        }
        match self.scheduled {
            None => DrivePhase::Idle,
            Some(ScheduleReason::Animation) => DrivePhase::AnimatingScheduled,
            Some(ScheduleReason::Interaction) | Some(ScheduleReason::Startup) => {
                DrivePhase::InputDrivenScheduled
            }
        }
    }

    /// Schedule unless a frame is already pending or running
    fn request(&mut self, reason: ScheduleReason) {
        if self.in_flight || self.scheduled.is_some() {
            return;
        }
        debug!("drive: frame scheduled ({reason:?})");
        self.scheduled = Some(reason);
    }

    pub fn play(&mut self) {
        if self.state.is_animating {
            return;
        }
        self.state.is_animating = true;
        self.request(ScheduleReason::Animation);
    }

    /// Freeze the animation clock; a running frame still completes
    pub fn pause(&mut self) {
        self.state.is_animating = false;
        self.state.last_timestamp = None;
    }

    pub fn toggle_play(&mut self) {
        if self.state.is_animating {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn interaction_start(&mut self) {
        self.state.is_user_interacting = true;
        self.request(ScheduleReason::Interaction);
    }

    /// Stop input-driven rescheduling without cancelling the current frame
    pub fn interaction_end(&mut self) {
        self.state.is_user_interacting = false;
    }

    /// Claim the scheduled frame, if any, and advance the animation clock
    ///
    /// Returns the animation time to render at. The clock only moves while
    /// animating, and never across a pause because pausing forgets the last
    /// timestamp.
    pub fn begin_frame(&mut self, now: Duration) -> Option<Duration> {
        if self.in_flight {
            return None;
        }
        self.scheduled.take()?;

        if self.state.is_animating {
            if let Some(last) = self.state.last_timestamp {
                self.state.accumulated_animation_time += now.saturating_sub(last);
            }
            self.state.last_timestamp = Some(now);
        }

        self.in_flight = true;
        Some(self.state.accumulated_animation_time)
    }

    /// Give a claimed frame back when it could not be dispatched
    pub fn abort_frame(&mut self, reason: ScheduleReason) {
        self.in_flight = false;
        self.scheduled = Some(reason);
    }

    /// React to the in-flight frame's swap
    pub fn frame_complete(&mut self) -> DrivePhase {
        self.in_flight = false;
        if self.state.is_animating {
            self.request(ScheduleReason::Animation);
        } else if self.state.is_user_interacting {
            self.request(ScheduleReason::Interaction);
        }
        self.phase()
    }
}

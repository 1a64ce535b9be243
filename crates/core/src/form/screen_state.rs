/// Lifecycle of one screen, from opening the camera to showing a result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScreenState {
    #[default]
    Idle,
    CameraActive,
    PhotoCaptured,
    Submitting,
    Success,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenEvent {
    CameraStarted,
    CameraStopped,
    /// A photo was captured or a file was chosen.
    PhotoTaken,
    PhotoDiscarded,
    SubmitStarted,
    SubmitSucceeded,
    SubmitFailed,
    /// Dismiss a result and start over without the camera.
    Retry,
}

impl ScreenState {
    /// The state after `event`, or `None` if the event is not valid here.
    pub fn next(self, event: ScreenEvent) -> Option<ScreenState> {
        use ScreenEvent as E;
        use ScreenState as S;

        match (self, event) {
            (S::Idle | S::Success | S::Failed, E::CameraStarted) => Some(S::CameraActive),
            (S::CameraActive, E::CameraStopped) => Some(S::Idle),
            (S::PhotoCaptured, E::CameraStopped) => Some(S::PhotoCaptured),
            (s, E::PhotoTaken) if s != S::Submitting => Some(S::PhotoCaptured),
            (S::PhotoCaptured, E::PhotoDiscarded) => Some(S::Idle),
            (S::PhotoCaptured | S::Success | S::Failed, E::SubmitStarted) => Some(S::Submitting),
            (S::Submitting, E::SubmitSucceeded) => Some(S::Success),
            (S::Submitting, E::SubmitFailed) => Some(S::Failed),
            (S::Success | S::Failed, E::Retry) => Some(S::Idle),
            _ => None,
        }
    }

    /// Applies `event` in place. Invalid events leave the state unchanged.
    pub fn apply(&mut self, event: ScreenEvent) -> bool {
        match self.next(event) {
            Some(next) => {
                *self = next;
                true
            }
            None => {
                log::debug!("Ignoring {event:?} in state {self:?}");
                false
            }
        }
    }
}

use std::ops::AddAssign;

// The smallest unit of audio; one stereo frame
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

impl StereoFrame {
    pub fn zero() -> Self { // just giving `default` a better name for clarity
        Self::default()
    }

    /// Equal-power placement of a mono sample, pan -1 (left) to 1 (right).
    pub fn panned(sample: f32, pan: f32) -> Self {
        let angle = (pan.clamp(-1.0, 1.0) + 1.0) * std::f32::consts::FRAC_PI_4;
        Self {
            left: sample * angle.cos(),
            right: sample * angle.sin(),
        }
    }

    pub fn scaled(self, gain: f32) -> Self {
        Self {
            left: self.left * gain,
            right: self.right * gain,
        }
    }

    // tanh saturation so a pile of voices can't clip the output hard
    pub fn soft_clip(self) -> Self {
        Self {
            left: self.left.tanh(),
            right: self.right.tanh(),
        }
    }
}

impl AddAssign for StereoFrame {
    fn add_assign(&mut self, rhs: Self) {
        self.left += rhs.left;
        self.right += rhs.right;
    }
}

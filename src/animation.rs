//! Named animation clips imported alongside a model.
//!
//! Only playback state is tracked here; the clip is identified by name and
//! its time range. Posing the model from keyframes is left to whatever
//! consumes `current_time`.

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationGroup {
    pub name: String,
    /// Seconds.
    pub from: f32,
    /// Seconds.
    pub to: f32,
    pub current_time: f32,
    pub speed_ratio: f32,
    playing: bool,
    looping: bool,
}

impl AnimationGroup {
    pub fn new(name: impl Into<String>, from: f32, to: f32) -> Self {
        Self {
            name: name.into(),
            from,
            to: to.max(from),
            current_time: from,
            speed_ratio: 1.0,
            playing: false,
            looping: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn duration(&self) -> f32 {
        self.to - self.from
    }

    /// Starts (or keeps) playing. An already playing clip is not rewound.
    pub fn play(&mut self, looping: bool) {
        if !self.playing {
            self.current_time = self.from;
        }
        self.playing = true;
        self.looping = looping;
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.current_time = self.from;
    }

    pub fn advance(&mut self, delta_secs: f32) {
        if !self.playing {
            return;
        }
        let duration = self.duration();
        if self.looping && duration <= 0.0 {
            // Single-keyframe pose.
            self.current_time = self.from;
            return;
        }
        let t = self.current_time + delta_secs * self.speed_ratio;
        if t <= self.to {
            self.current_time = t;
        } else if self.looping {
            self.current_time = self.from + (t - self.from) % duration;
        } else {
            self.current_time = self.to;
            self.playing = false;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationSet {
    pub groups: Vec<AnimationGroup>,
}

impl AnimationSet {
    pub fn new(groups: Vec<AnimationGroup>) -> Self {
        Self { groups }
    }

    pub fn get(&self, name: &str) -> Option<&AnimationGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Loops the named clip and stops every other one.
    pub fn play_exclusive(&mut self, name: &str) {
        if self.get(name).is_none() {
            log::warn!("No animation named {name:?}; stopping all clips");
        }
        for group in &mut self.groups {
            if group.name == name {
                group.play(true);
            } else {
                group.stop();
            }
        }
    }

    pub fn playing(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .filter(|g| g.is_playing())
            .map(|g| g.name.as_str())
    }

    pub fn advance(&mut self, delta_secs: f32) {
        for group in &mut self.groups {
            group.advance(delta_secs);
        }
    }
}

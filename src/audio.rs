//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::games::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Countdown beat / short tick
    Tick,
    /// Go signal
    Go,
    /// Coin or correct answer
    Coin,
    Jump,
    Crash,
    /// Timer stop / shot fired
    Whoosh,
    Perfect,
    Great,
    /// Bad timing, wrong answer, lost round
    Buzz,
    Punch,
    Snap,
    LineClear,
    Milestone,
    GameOver,
    HighScore,
}

impl SoundEffect {
    /// Sound for a game event, if it has one
    pub fn for_event(event: GameEvent) -> Option<Self> {
        Some(match event {
            GameEvent::Count | GameEvent::Move | GameEvent::Rotate => SoundEffect::Tick,
            GameEvent::Go | GameEvent::Start | GameEvent::Reveal => SoundEffect::Go,
            GameEvent::Coin | GameEvent::Correct | GameEvent::Safe | GameEvent::Win => SoundEffect::Coin,
            GameEvent::Jump | GameEvent::Dodge => SoundEffect::Jump,
            GameEvent::Crash | GameEvent::Damage => SoundEffect::Crash,
            GameEvent::Stop | GameEvent::Shoot => SoundEffect::Whoosh,
            GameEvent::Perfect | GameEvent::Combo => SoundEffect::Perfect,
            GameEvent::Great | GameEvent::Good => SoundEffect::Great,
            GameEvent::Fail | GameEvent::Miss | GameEvent::Lose | GameEvent::Draw => SoundEffect::Buzz,
            GameEvent::Punch => SoundEffect::Punch,
            GameEvent::Snap | GameEvent::Lock => SoundEffect::Snap,
            GameEvent::LineClear(_) => SoundEffect::LineClear,
            GameEvent::Milestone => SoundEffect::Milestone,
            GameEvent::GameOver => SoundEffect::GameOver,
            GameEvent::NewRecord => SoundEffect::HighScore,
            GameEvent::DroneStart | GameEvent::DroneStop => return None,
        })
    }
}

/// Audio manager for the arcade
pub struct AudioManager {
    ctx: Option<AudioContext>,
    volume: f32,
    /// Low pulsing tone held while Light Stop waits
    drone: Option<(OscillatorNode, OscillatorNode, GainNode)>,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            volume: 0.8,
            drone: None,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Set effective volume (0.0 - 1.0), usually `Settings::effective_volume`
    pub fn set_volume(&mut self, vol: f32) {
        self.volume = vol.clamp(0.0, 1.0);
        if self.volume <= 0.0 {
            self.stop_drone();
        }
    }

    /// React to one drained game event
    pub fn handle(&mut self, event: GameEvent) {
        match event {
            GameEvent::DroneStart => self.start_drone(),
            GameEvent::DroneStop => self.stop_drone(),
            other => {
                if let Some(effect) = SoundEffect::for_event(other) {
                    self.play(effect);
                }
            }
        }
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        let vol = self.volume;
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Browsers suspend until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Tick => self.blip(ctx, 800.0, OscillatorType::Sine, vol * 0.3, 0.05),
            SoundEffect::Go => self.sweep(ctx, 880.0, 1760.0, OscillatorType::Sine, vol * 0.35, 0.1),
            SoundEffect::Coin => self.arpeggio(ctx, &[880.0, 1320.0], OscillatorType::Square, vol * 0.15, 0.07),
            SoundEffect::Jump => self.sweep(ctx, 300.0, 600.0, OscillatorType::Triangle, vol * 0.3, 0.12),
            SoundEffect::Crash => self.play_crash(ctx, vol),
            SoundEffect::Whoosh => self.sweep(ctx, 600.0, 100.0, OscillatorType::Triangle, vol * 0.4, 0.2),
            SoundEffect::Perfect => {
                self.arpeggio(ctx, &[523.25, 659.25, 783.99, 1046.5], OscillatorType::Sine, vol * 0.35, 0.08)
            }
            SoundEffect::Great => self.arpeggio(ctx, &[523.25, 659.25], OscillatorType::Sine, vol * 0.35, 0.0),
            SoundEffect::Buzz => self.sweep(ctx, 200.0, 150.0, OscillatorType::Sawtooth, vol * 0.3, 0.2),
            SoundEffect::Punch => self.sweep(ctx, 150.0, 60.0, OscillatorType::Sine, vol * 0.6, 0.1),
            SoundEffect::Snap => self.blip(ctx, 800.0, OscillatorType::Sine, vol * 0.35, 0.05),
            SoundEffect::LineClear => self.sweep(ctx, 1000.0, 2000.0, OscillatorType::Sine, vol * 0.35, 0.5),
            SoundEffect::Milestone => {
                self.arpeggio(ctx, &[400.0, 500.0, 600.0, 800.0], OscillatorType::Triangle, vol * 0.3, 0.1)
            }
            SoundEffect::GameOver => self.sweep(ctx, 100.0, 50.0, OscillatorType::Sawtooth, vol * 0.6, 0.5),
            SoundEffect::HighScore => self.arpeggio(
                ctx,
                &[500.0, 600.0, 700.0, 800.0, 1000.0],
                OscillatorType::Triangle,
                vol * 0.25,
                0.08,
            ),
        }
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Single tone with a fast decay
    fn blip(&self, ctx: &AudioContext, freq: f32, osc_type: OscillatorType, gain_level: f32, len: f64) {
        let Some((osc, gain)) = self.create_osc(ctx, freq, osc_type) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(gain_level, t).ok();
        gain.gain().exponential_ramp_to_value_at_time(0.001, t + len).ok();

        osc.start().ok();
        osc.stop_with_when(t + len + 0.02).ok();
    }

    /// Pitch glide from `from` to `to`
    fn sweep(
        &self,
        ctx: &AudioContext,
        from: f32,
        to: f32,
        osc_type: OscillatorType,
        gain_level: f32,
        len: f64,
    ) {
        let Some((osc, gain)) = self.create_osc(ctx, from, osc_type) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(gain_level, t).ok();
        gain.gain().exponential_ramp_to_value_at_time(0.01, t + len).ok();
        osc.frequency().set_value_at_time(from, t).ok();
        osc.frequency().exponential_ramp_to_value_at_time(to, t + len).ok();

        osc.start().ok();
        osc.stop_with_when(t + len + 0.05).ok();
    }

    /// Notes started `step` seconds apart (0 plays a chord)
    fn arpeggio(&self, ctx: &AudioContext, notes: &[f32], osc_type: OscillatorType, gain_level: f32, step: f64) {
        for (i, freq) in notes.iter().enumerate() {
            let delay = i as f64 * step;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, osc_type) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(gain_level, t).ok();
                gain.gain().linear_ramp_to_value_at_time(0.01, t + 0.3).ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.35).ok();
            }
        }
    }

    /// Crash - low boom with a crack on top
    fn play_crash(&self, ctx: &AudioContext, vol: f32) {
        self.sweep(ctx, 100.0, 30.0, OscillatorType::Sawtooth, vol * 0.5, 0.4);

        if let Some((osc, gain)) = self.create_osc(ctx, 1500.0, OscillatorType::Square) {
            let t = ctx.current_time();
            gain.gain().set_value_at_time(vol * 0.2, t).ok();
            gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.1).ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.15).ok();
        }
    }

    /// 60 Hz triangle with a 2 Hz heartbeat wobble
    fn start_drone(&mut self) {
        if self.drone.is_some() || self.volume <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };
        let Some((osc, gain)) = self.create_osc(ctx, 60.0, OscillatorType::Triangle) else {
            return;
        };
        let Some((lfo, lfo_gain)) = self.create_osc(ctx, 2.0, OscillatorType::Sine) else {
            return;
        };
        // Reroute the LFO from the speakers onto the drone's pitch
        lfo_gain.disconnect().ok();
        lfo_gain.gain().set_value(5.0);
        lfo_gain.connect_with_audio_param(&osc.frequency()).ok();

        let t = ctx.current_time();
        gain.gain().set_value_at_time(0.001, t).ok();
        gain.gain()
            .linear_ramp_to_value_at_time(self.volume * 0.2, t + 0.5)
            .ok();
        osc.start().ok();
        lfo.start().ok();
        self.drone = Some((osc, lfo, gain));
    }

    fn stop_drone(&mut self) {
        let Some((osc, lfo, gain)) = self.drone.take() else {
            return;
        };
        if let Some(ctx) = &self.ctx {
            let t = ctx.current_time();
            gain.gain().set_value_at_time(gain.gain().value(), t).ok();
            gain.gain().linear_ramp_to_value_at_time(0.0, t + 0.1).ok();
            osc.stop_with_when(t + 0.12).ok();
            lfo.stop_with_when(t + 0.12).ok();
        }
    }
}

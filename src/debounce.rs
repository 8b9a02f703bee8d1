//! Debounced button latches.
//!
//! Each button owns a two-state machine. `Armed` accepts the very first edge
//! unconditionally; `Holdoff` accepts an edge only once the debounce window
//! has passed since the last accepted one. Accepted edges toggle the button's
//! bits in [`ControlState`].

use typed_fsm::{state_machine, Transition};

use crate::control::{ButtonId, ControlState};

// FSM Context
pub(crate) struct DebounceContext {
    pub(crate) window_us: u32,
    pub(crate) last_accepted_us: u32, // Only meaningful once out of `Armed`
    pub(crate) accepted: bool,        // Set by the last dispatch when the edge passed
}

// FSM Events
#[derive(Clone, Copy, Debug)]
pub(crate) enum DebounceEvent {
    FallingEdge(u32), // Monotonic timestamp in microseconds
}

// State Machine Definition
state_machine! {
    Name: DebounceFsm,
    Context: DebounceContext,
    Event: DebounceEvent,
    States: {
        // State: no edge accepted yet
        Armed => {
            entry: |ctx| {
                ctx.accepted = false;
            }
            process: |ctx, evt| {
                match evt {
                    DebounceEvent::FallingEdge(now) => {
                        ctx.last_accepted_us = *now;
                        ctx.accepted = true;
                        Transition::To(DebounceFsm::Holdoff)
                    }
                }
            }
        },

        // State: measuring from the last accepted edge
        Holdoff => {
            entry: |_ctx| {}
            process: |ctx, evt| {
                match evt {
                    DebounceEvent::FallingEdge(now) => {
                        // Wrapping subtraction keeps this right across the u32 rollover
                        let elapsed = now.wrapping_sub(ctx.last_accepted_us);
                        if elapsed >= ctx.window_us {
                            ctx.last_accepted_us = *now;
                            ctx.accepted = true;
                        }
                        Transition::None
                    }
                }
            }
        }
    }
}

/// Debounce filter for one button.
pub struct ButtonLatch {
    button: ButtonId,
    fsm: DebounceFsm,
    ctx: DebounceContext,
}

impl ButtonLatch {
    pub fn new(button: ButtonId, window_us: u32) -> Self {
        let mut ctx = DebounceContext { window_us, last_accepted_us: 0, accepted: false };
        let mut fsm = DebounceFsm::Armed;
        fsm.init(&mut ctx);
        Self { button, fsm, ctx }
    }

    /// Feeds one falling edge seen at `now_us`.
    ///
    /// Returns `true` when the edge was accepted and the button's toggle was
    /// applied to `state`. Rejected edges leave everything untouched. Never
    /// blocks, so it is safe to call from an interrupt handler.
    pub fn on_edge_event(&mut self, now_us: u32, state: &ControlState) -> bool {
        self.ctx.accepted = false;
        self.fsm.dispatch(&mut self.ctx, &DebounceEvent::FallingEdge(now_us));

        if self.ctx.accepted {
            state.toggle(self.button);
            trace!("{} accepted at {=u32}us", self.button, now_us);
        }
        self.ctx.accepted
    }
}

/// The latches for every button on the board.
pub struct LatchBank {
    joystick: ButtonLatch,
    button_a: ButtonLatch,
}

impl LatchBank {
    pub fn new(window_us: u32) -> Self {
        Self {
            joystick: ButtonLatch::new(ButtonId::Joystick, window_us),
            button_a: ButtonLatch::new(ButtonId::ButtonA, window_us),
        }
    }

    /// Routes an edge to the latch of `button`. See [`ButtonLatch::on_edge_event`].
    pub fn on_edge_event(&mut self, button: ButtonId, now_us: u32, state: &ControlState) -> bool {
        self.latch_mut(button).on_edge_event(now_us, state)
    }

    fn latch_mut(&mut self, button: ButtonId) -> &mut ButtonLatch {
        match button {
            ButtonId::Joystick => &mut self.joystick,
            ButtonId::ButtonA => &mut self.button_a,
        }
    }
}

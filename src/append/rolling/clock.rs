// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use jiff::Zoned;

/// Where the rolling writer reads wall-clock time from.
///
/// Rotation boundaries, stale-file detection, and filename stamps all go
/// through this seam, so the rollover state machine can be driven across
/// simulated boundaries in tests instead of sleeping through real ones.
#[derive(Debug)]
pub(crate) enum WallClock {
    /// The system clock.
    System,
    /// A clock that only moves when advanced.
    #[cfg(test)]
    Simulated(Zoned),
}

impl WallClock {
    pub(crate) fn current(&self) -> Zoned {
        match self {
            WallClock::System => Zoned::now(),
            #[cfg(test)]
            WallClock::Simulated(now) => now.clone(),
        }
    }

    /// Move a simulated clock forward. The system clock is left alone.
    #[cfg(test)]
    pub(crate) fn advance(&mut self, span: jiff::Span) {
        if let WallClock::Simulated(now) = self {
            *now = now
                .checked_add(span)
                .expect("simulated clock arithmetic overflowed");
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::Span;

    use super::*;
    use crate::append::rolling::RotationLogic;
    use crate::append::rolling::When;

    #[test]
    fn test_simulated_clock_crosses_rollover_boundaries() {
        let mut clock = WallClock::Simulated("2024-08-10T00:00:00[UTC]".parse().unwrap());
        let logic = RotationLogic::builder()
            .when(When::Second)
            .interval(5)
            .build()
            .unwrap();

        let boundary = logic.next_rollover(&clock.current()).unwrap();
        clock.advance(Span::new().seconds(4));
        assert!(clock.current().timestamp().as_millisecond() < boundary);

        clock.advance(Span::new().seconds(1));
        assert!(clock.current().timestamp().as_millisecond() >= boundary);
    }

    #[test]
    fn test_system_clock_ignores_advance() {
        let mut clock = WallClock::System;
        let before = clock.current();
        clock.advance(Span::new().hours(1));
        let after = clock.current();
        // both reads stay close to real time
        assert!(after.timestamp() >= before.timestamp());
        assert!(
            (after.timestamp().as_millisecond() - before.timestamp().as_millisecond()) < 60_000
        );
    }
}

/*
    Nyx, blazing fast astrodynamics
    Copyright (C) 2023 Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::io::{epoch_from_str, epoch_to_str};
use crate::time::{Duration, Epoch};
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// A closed time interval. The start is never after the end.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    start: Epoch,
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    end: Epoch,
}

impl Window {
    /// Builds a new window, swapping the bounds if they are provided in reverse order.
    pub fn new(start: Epoch, end: Epoch) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Builds a window starting at `start` and lasting `length` (a negative length ends at `start`).
    pub fn from_length(start: Epoch, length: Duration) -> Self {
        Self::new(start, start + length)
    }

    /// Builds a degenerate window where start and end are the same epoch.
    pub fn instant(epoch: Epoch) -> Self {
        Self {
            start: epoch,
            end: epoch,
        }
    }

    pub fn start(&self) -> Epoch {
        self.start
    }

    pub fn end(&self) -> Epoch {
        self.end
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    /// Returns true if start and end are the same epoch.
    pub fn is_instant(&self) -> bool {
        self.start == self.end
    }

    /// Returns the smallest window covering both windows.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Returns true if both windows share at least one epoch, boundaries included.
    pub fn intersects(&self, other: &Self) -> bool {
        other.start <= self.end && other.end >= self.start
    }

    /// Returns true if the epoch is within this window, boundaries included.
    pub fn contains(&self, epoch: Epoch) -> bool {
        epoch >= self.start && epoch <= self.end
    }

    /// Returns the overlapping window, or None if the windows do not intersect.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if self.intersects(other) {
            Some(Self {
                start: self.start.max(other.start),
                end: self.end.min(other.end),
            })
        } else {
            None
        }
    }

    /// Splits this window in consecutive chunks of at most `step`, the last one may be shorter.
    pub fn split(&self, step: Duration) -> Vec<Self> {
        let mut chunks = Vec::new();
        if step <= Duration::ZERO || self.is_instant() {
            chunks.push(*self);
            return chunks;
        }
        let mut start = self.start;
        while start < self.end {
            let end = (start + step).min(self.end);
            chunks.push(Self { start, end });
            start = end;
        }
        chunks
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

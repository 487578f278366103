use crate::color::Color;
use core::ops::{Index, IndexMut};
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One value per team, indexable by [`Color`]
#[derive(Derivative, Serialize, Deserialize)]
#[derivative(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlackWhiteBundle<T> {
    pub black: T,
    pub white: T,
}

impl<T> BlackWhiteBundle<T> {
    pub fn new(black: T, white: T) -> Self {
        Self { black, white }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> BlackWhiteBundle<U> {
        BlackWhiteBundle {
            black: f(self.black),
            white: f(self.white),
        }
    }

    pub fn for_each_mut<F: FnMut(Color, &mut T)>(&mut self, mut f: F) {
        f(Color::Black, &mut self.black);
        f(Color::White, &mut self.white);
    }
}

impl<T: Clone> BlackWhiteBundle<T> {
    pub fn splat(value: T) -> Self {
        Self {
            black: value.clone(),
            white: value,
        }
    }
}

impl<T> Index<Color> for BlackWhiteBundle<T> {
    type Output = T;

    fn index(&self, color: Color) -> &Self::Output {
        match color {
            Color::Black => &self.black,
            Color::White => &self.white,
        }
    }
}

impl<T> IndexMut<Color> for BlackWhiteBundle<T> {
    fn index_mut(&mut self, color: Color) -> &mut Self::Output {
        match color {
            Color::Black => &mut self.black,
            Color::White => &mut self.white,
        }
    }
}

impl<T: Display> Display for BlackWhiteBundle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Black: {}, White: {}", self.black, self.white)
    }
}

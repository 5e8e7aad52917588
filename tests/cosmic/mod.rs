mod bodies;
mod geodetic;
mod orbit;
mod tle;
mod window;

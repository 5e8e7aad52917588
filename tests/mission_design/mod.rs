mod launch;
mod maneuvers;

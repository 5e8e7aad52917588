mod spacecraft;

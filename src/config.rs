pub const DEFAULT_TOLERANCE: f64 = 5.0; // border tolerance between object and tank wall [mm]
pub const VOXEL_RES: usize = 32; // edge length of the training voxel grid
pub const VOXEL_MARGIN: i64 = 3; // voxels kept free at each border of the grid
pub const GANTRY_CENTER: (f64, f64) = (180.0, 180.0); // x,y of the tank axis in gantry coordinates

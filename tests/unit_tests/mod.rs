mod block_dof_map;
mod continuity;
mod kernels;
mod mesh;
mod octree;
mod test_info;

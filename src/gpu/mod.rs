pub mod gpu_memory;

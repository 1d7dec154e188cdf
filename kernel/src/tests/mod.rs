/*
 * Boot Test Suite for the Solo Kernel
 *
 * In-kernel tests run during boot against the real allocators, logging
 * their results.
 *
 * - `ordered_array::run_self_test()` - heap index container checks
 */

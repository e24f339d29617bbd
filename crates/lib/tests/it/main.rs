/*! Integration tests for treepatch.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - tree: Tests for Node, Value, and KeyPath (path addressing, enumeration)
 * - diff: Tests for diff/apply/modifier helpers
 * - merge: Tests for the operator-tagged merge algebra
 * - serialization: Wire-shape tests for trees and modifiers
 * - update: Tests for the Store-driven reconciliation cycle
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("treepatch=debug".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod diff;
mod helpers;

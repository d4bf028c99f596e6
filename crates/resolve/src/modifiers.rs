//! Requirements implied by other requirements

use modsmith_config::LibraryModifier;
use modsmith_core::RequiresMap;
use std::collections::BTreeSet;
use tracing::debug;

const JUPITER: &str = "org.junit.jupiter";
const JUPITER_API: &str = "org.junit.jupiter.api";
const JUPITER_ENGINE: &str = "org.junit.jupiter.engine";
const JUNIT4: &str = "junit";
const VINTAGE_ENGINE: &str = "org.junit.vintage.engine";
const PLATFORM_CONSOLE: &str = "org.junit.platform.console";

/// Add the modules the enabled modifiers imply.
///
/// Test engines are added before the console so an engine added here also
/// pulls in the console.
pub fn apply(modifiers: &BTreeSet<LibraryModifier>, requires: &mut RequiresMap) {
    if modifiers.contains(&LibraryModifier::AddMissingJUnitTestEngines) {
        if requires.contains(JUPITER) || requires.contains(JUPITER_API) {
            add_missing(requires, JUPITER_ENGINE);
        }
        if requires.contains(JUNIT4) {
            add_missing(requires, VINTAGE_ENGINE);
        }
    }
    if modifiers.contains(&LibraryModifier::AddMissingJUnitPlatformConsole)
        && (requires.contains(JUPITER_ENGINE) || requires.contains(VINTAGE_ENGINE))
    {
        add_missing(requires, PLATFORM_CONSOLE);
    }
}

fn add_missing(requires: &mut RequiresMap, module: &str) {
    if !requires.contains(module) {
        debug!(module, "adding implied requirement");
        requires.insert(module);
    }
}

use crate::bootstrap::App;
use courtops_runtime::PRESETS;

pub fn run(app: &App) {
    println!("Whitelisted tools ({}):", app.registry.count());
    for spec in app.registry.list_tools() {
        println!("  {:<38} {}", spec.name, spec.description);
    }

    println!("\nPresets:");
    for preset in PRESETS {
        println!("  {:<38} {}", preset.name, preset.description);
        println!("  {:<38} requires: {}", "", preset.required_tools.join(", "));
    }
}

use std::env;

use crate::app_info::AppInfo;

pub fn print_version_info(app: AppInfo) {
    println!("📦 {} v{}", app.name, app.version);

    if !app.description.is_empty() {
        println!("📝 {}", app.description);
    }

    println!();
    println!("💻 Runtime:");
    println!("  🖥️  OS: {}", env::consts::OS);
    println!("  🏗️  Architecture: {}", env::consts::ARCH);
}

use deskbook_core::Institution;

pub fn list() {
    println!("Available SSO providers:");
    for institution in Institution::ALL {
        let profile = institution.profile();
        println!(
            "  {:<4} {} ({}, books {} days ahead)",
            institution.key(),
            profile.display_name,
            profile.federation_domain,
            profile.days_ahead
        );
    }
}

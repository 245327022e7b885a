use vidcoach::analyze::PromptProfile;

pub fn cmd_prompt(profile: PromptProfile) {
    println!("{}", profile.template());
}

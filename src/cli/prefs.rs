//! Preference command implementations

use anyhow::Result;

use crate::store::{PreferencesPatch, Store, UserPreferences};

pub fn show(store: &Store, user: &str) -> Result<()> {
    let prefs = store.get_or_create_preferences(user)?;
    print(&prefs);
    Ok(())
}

pub fn set(store: &Store, user: &str, patch: PreferencesPatch) -> Result<()> {
    let prefs = store.update_preferences(user, &patch)?;
    println!("Updated preferences for '{}'", user);
    print(&prefs);
    Ok(())
}

fn print(prefs: &UserPreferences) {
    println!("User:                {}", prefs.user_id);
    println!("Smart learning:      {}", if prefs.use_smart_learning { "on" } else { "off" });
    println!("Learning intensity:  {}", prefs.learning_intensity);
    println!("Min overall rating:  {}", prefs.min_overall_rating);
    println!("Min platform rating: {}", prefs.min_platform_rating);
    if let Some(weights) = &prefs.personalized_weights {
        println!("Weights:             {}", weights);
    }
    println!("Updated:             {}", prefs.updated_at);
}

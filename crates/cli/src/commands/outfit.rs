//! `wardrobe outfit` — Recommend an outfit from the stored wardrobe.

use wardrobe_core::wardrobe::OutfitPlan;
use wardrobe_core::weather::WeatherSnapshot;

pub async fn run(destination: &str, activity: &str) -> Result<(), Box<dyn std::error::Error>> {
    let service = super::load_service(true)?;

    let cancel = super::cancel_on_ctrl_c();
    eprint!("  Thinking...");
    let recommendation = service.recommend(destination, activity, None, &cancel).await;
    eprint!("\r              \r");

    let recommendation = recommendation?;
    match &recommendation.weather {
        Some(snapshot) => println!("{}", render_conditions(snapshot)),
        None => println!("  Weather unavailable; planned without it."),
    }
    print!("{}", render_plan(&recommendation.plan));
    println!("\nRate it: wardrobe feedback --score <1-5> --comment \"...\"");
    Ok(())
}

fn render_conditions(snapshot: &WeatherSnapshot) -> String {
    format!(
        "  {}: {}°C, {}",
        snapshot.location_label, snapshot.temperature, snapshot.condition
    )
}

fn render_plan(plan: &OutfitPlan) -> String {
    let mut out = String::from("\nToday's outfit:\n");
    for pick in &plan.outfit {
        out.push_str(&format!("  • {} — {}\n", pick.item, pick.reason));
    }
    if !plan.tip.trim().is_empty() {
        out.push_str(&format!("\nTip: {}\n", plan.tip));
    }
    out
}

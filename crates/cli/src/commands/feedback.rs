//! `wardrobe feedback` — Record a rating that shapes future recommendations.

pub async fn run(score: u8, comment: &str) -> Result<(), Box<dyn std::error::Error>> {
    let service = super::load_service(false)?;
    let record = service.add_feedback(score, comment).await?;
    println!("Saved {}/5 for {}.", record.score, record.date);
    Ok(())
}

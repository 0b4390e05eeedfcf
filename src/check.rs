use anyhow::Context as _;

use crate::cli::CheckArgs;
use crate::config::StoreConfig;
use crate::formats::{ItineraryRecord, PublishStatus};
use crate::importer::DEFAULT_CURRENCY;
use crate::store::{ContentStore, StrapiClient};

const PROBE_TITLE: &str = "itinerary-import connectivity probe";

pub async fn run(args: CheckArgs) -> anyhow::Result<()> {
    let config = StoreConfig::from_env(args.store.base_url.as_deref())?;
    tracing::debug!(?config, "resolved store config");
    let client = StrapiClient::new(&config)?;

    println!("Content store: {}", client.base_url());

    client.health().await.context("health check")?;
    println!("Health: ok");

    let listing = client
        .get_json("api/itineraries?pagination[limit]=1")
        .await
        .context("list itineraries")?;
    let total = listing
        .pointer("/meta/pagination/total")
        .and_then(|total| total.as_u64());
    match total {
        Some(total) => println!("Itineraries: ok ({total} stored)"),
        None => println!("Itineraries: ok"),
    }

    if args.write_probe {
        write_probe(&client).await.context("write probe")?;
        println!("Write probe: ok");
    }

    Ok(())
}

pub async fn write_probe<S: ContentStore + ?Sized>(store: &S) -> anyhow::Result<()> {
    let created = store
        .create_itinerary(&probe_record())
        .await
        .context("create probe itinerary")?;
    let path_id = created
        .path_id()
        .context("probe itinerary came back without an id")?;
    tracing::debug!(%path_id, "created probe itinerary");

    store
        .delete_itinerary(&path_id)
        .await
        .with_context(|| format!("delete probe itinerary {path_id}"))?;
    Ok(())
}

fn probe_record() -> ItineraryRecord {
    ItineraryRecord {
        title: PROBE_TITLE.to_owned(),
        country: "Nowhere".to_owned(),
        region: None,
        city: None,
        tags: Vec::new(),
        price: None,
        currency: DEFAULT_CURRENCY.to_owned(),
        is_free: true,
        highlights: None,
        publish_status: PublishStatus::Draft,
        days: Vec::new(),
    }
}

use chrono::NaiveDate;
use hemolink::donors::{
    BloodGroup, DonorDirectory, DonorPatch, DonorSearch, DonorStatus, InMemoryDonorDirectory,
    NewDonor,
};

fn register(
    directory: &InMemoryDonorDirectory,
    name: &str,
    group: BloodGroup,
    location: &str,
) -> hemolink::donors::DonorId {
    directory
        .create(NewDonor {
            name: name.to_string(),
            blood_group: group,
            location: location.to_string(),
            contact_number: "9840000000".to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            last_donation: NaiveDate::from_ymd_opt(2026, 4, 18).expect("valid date"),
        })
        .expect("donor registered")
}

fn seeded_directory() -> InMemoryDonorDirectory {
    let directory = InMemoryDonorDirectory::new();
    register(&directory, "Arun Kumar", BloodGroup::OPositive, "Anna Nagar");
    register(&directory, "Meena", BloodGroup::OPositive, "Velachery");
    register(&directory, "Joseph", BloodGroup::ANegative, "T Nagar");
    register(&directory, "Priya", BloodGroup::OPositive, "Ashok Nagar");
    directory
}

#[test]
fn match_stage_restricts_group_exactly_then_filters_location() {
    let directory = seeded_directory();
    let search = DonorSearch::default();

    let matched = search.run(
        Some(BloodGroup::OPositive),
        "nagar",
        directory.list_all().expect("scan"),
    );

    assert!(matched
        .iter()
        .all(|donor| donor.blood_group == BloodGroup::OPositive));
    let names: Vec<&str> = matched.iter().map(|donor| donor.name.as_str()).collect();
    // Directory scan is newest first, and the filter preserves that order.
    assert_eq!(names, vec!["Priya", "Arun Kumar"]);
}

#[test]
fn unconstrained_match_returns_the_whole_scan() {
    let directory = seeded_directory();
    let search = DonorSearch::default();

    let scan = directory.list_all().expect("scan");
    let scanned: Vec<String> = scan.iter().map(|donor| donor.name.clone()).collect();
    let matched = search.run(None, "", scan);

    let names: Vec<String> = matched.iter().map(|donor| donor.name.clone()).collect();
    assert_eq!(names, scanned);
}

#[test]
fn misspelled_query_still_finds_nearby_locations() {
    let directory = seeded_directory();
    let search = DonorSearch::default();

    let matched = search.run(
        Some(BloodGroup::OPositive),
        "velachari",
        directory.list_all().expect("scan"),
    );

    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].name, "Meena");
}

#[test]
fn deactivated_donors_remain_visible_to_the_scan() {
    let directory = InMemoryDonorDirectory::new();
    let id = register(&directory, "Arun Kumar", BloodGroup::OPositive, "Anna Nagar");
    directory
        .update(
            &id,
            DonorPatch {
                status: Some(DonorStatus::Inactive),
                ..DonorPatch::default()
            },
        )
        .expect("donor updated");

    // Status policy lives with the caller; the match stage does not
    // second-guess the directory contents.
    let matched = DonorSearch::default().run(None, "nagar", directory.list_all().expect("scan"));
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].status, DonorStatus::Inactive);
}

mod test_archive;

mod test_access_token;
